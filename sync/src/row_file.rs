//! Row-addressed file writes.
//!
//! A [`RowFile`] is a file laid out as a prefix, a run of encoded rows and a
//! footer. It remembers the byte offset of every row, so rewriting from row
//! `n` on truncates the file at that offset and appends, without touching
//! the rows before it.

use crate::{error::Result, SyncError};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

#[derive(Debug)]
pub(crate) struct RowFile {
    path: PathBuf,
    /// Start of every row, then the end of the last one.
    offsets: Vec<u64>,
    footer: Vec<u8>,
}

impl RowFile {
    /// Write `prefix`, `rows` and `footer` as a fresh file.
    pub(crate) async fn create(
        path: &Path,
        prefix: &[u8],
        rows: impl IntoIterator<Item = Vec<u8>>,
        footer: Vec<u8>,
    ) -> Result<Self> {
        let mut bytes = prefix.to_vec();
        let mut offsets = vec![bytes.len() as u64];
        for row in rows {
            bytes.extend_from_slice(&row);
            offsets.push(bytes.len() as u64);
        }
        bytes.extend_from_slice(&footer);

        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| SyncError::file(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            offsets,
            footer,
        })
    }

    /// Number of rows in the file.
    pub(crate) fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Replace every row from `start` on with `rows`.
    ///
    /// `start` past the last row appends.
    pub(crate) async fn replace_from(&mut self, start: usize, rows: Vec<Vec<u8>>) -> Result<()> {
        let start = start.min(self.rows());
        let offset = self.offsets[start];

        let mut tail = Vec::new();
        self.offsets.truncate(start + 1);
        let mut end = offset;
        for row in rows {
            end += row.len() as u64;
            tail.extend_from_slice(&row);
            self.offsets.push(end);
        }
        tail.extend_from_slice(&self.footer);

        let io = |e: std::io::Error| SyncError::file(&self.path, e);
        let mut file = OpenOptions::new().write(true).open(&self.path).await.map_err(io)?;
        file.set_len(offset).await.map_err(io)?;
        file.seek(SeekFrom::Start(offset)).await.map_err(io)?;
        file.write_all(&tail).await.map_err(io)?;
        file.flush().await.map_err(io)?;
        Ok(())
    }
}
