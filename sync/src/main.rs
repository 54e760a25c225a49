//! Tablesync - combine two table files into a third.

use clap::Parser;
use std::path::PathBuf;
use tablesync::{config, sync_files, Config, MergeMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tablesync", about = "Merge or append two JSON/TSV tables")]
struct Args {
    /// Left table (wins conflicts under soft_merge)
    #[arg(long)]
    left: PathBuf,

    /// Right table
    #[arg(long)]
    right: PathBuf,

    /// Where to write the combined table
    #[arg(long)]
    output: PathBuf,

    /// append, append_no_duplicates, soft_merge or hard_merge
    #[arg(long)]
    mode: Option<MergeMode>,

    /// Key column of the left table
    #[arg(long)]
    left_key: Option<String>,

    /// Key column of the right table
    #[arg(long)]
    right_key: Option<String>,

    /// Records per read or write call
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing, after .env so RUST_LOG can come from it
    tracing_subscriber::registry()
        .with(config::load_env(None))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(mode) = args.mode {
        config.merge_mode = mode;
    }
    if args.left_key.is_some() {
        config.left_key = args.left_key;
    }
    if args.right_key.is_some() {
        config.right_key = args.right_key;
    }
    if let Some(size) = args.batch_size.filter(|size| *size > 0) {
        config.batch_size = size;
    }

    tracing::info!(
        left = %args.left.display(),
        right = %args.right.display(),
        mode = %config.merge_mode,
        "starting sync"
    );

    let summary = sync_files(&config, &args.left, &args.right, &args.output).await?;
    tracing::info!(
        left = summary.left_records,
        right = summary.right_records,
        written = summary.written_records,
        output = %args.output.display(),
        "done"
    );

    Ok(())
}
