use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use textdex_core::IndexStore;
use textdex_indexer::{FsSource, Pipeline, PipelineConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "textdex-indexer")]
#[command(about = "Measure parallel indexing throughput over a folder of text files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a folder once per worker count, each run into a fresh index
    Bench {
        /// Folder to index
        #[arg(long)]
        input: PathBuf,
        /// Worker counts to try (repeat the flag for several runs)
        #[arg(long = "workers", default_values_t = [1usize, 2, 4, 8])]
        workers: Vec<usize>,
        /// File extension to index
        #[arg(long, default_value = FsSource::DEFAULT_EXTENSION)]
        extension: String,
        /// Grace period in milliseconds for stopping workers after a failure
        #[arg(long, default_value_t = 5000)]
        grace_ms: u64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { input, workers, extension, grace_ms } => {
            bench(&input, &workers, &extension, Duration::from_millis(grace_ms))
        }
    }
}

fn bench(input: &Path, worker_counts: &[usize], extension: &str, grace_period: Duration) -> Result<()> {
    let source = Arc::new(FsSource::new(extension));
    for &workers in worker_counts {
        let store = Arc::new(IndexStore::new());
        let config = PipelineConfig::new(workers).with_grace_period(grace_period);
        let pipeline = Pipeline::new(store.clone(), source.clone(), config)?;
        let stats = pipeline.index_folder(input)?;
        if stats.is_empty() {
            tracing::warn!(input = %input.display(), "no files found");
            return Ok(());
        }
        let line = serde_json::json!({
            "requested_workers": workers,
            "stats": stats,
            "documents": store.document_count(),
            "terms": store.term_count(),
        });
        println!("{line}");
    }
    Ok(())
}
