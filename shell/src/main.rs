use anyhow::Result;
use clap::Parser;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use textdex_core::IndexStore;
use textdex_indexer::{FsSource, Pipeline, PipelineConfig};
use textdex_shell::{OutputFormat, Shell};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "textdex")]
#[command(about = "Index folders of text files and run AND queries over them")]
struct Args {
    /// Number of indexing worker threads
    workers: usize,
    /// File extension to index
    #[arg(long, default_value = FsSource::DEFAULT_EXTENSION)]
    extension: String,
    /// Print results as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Grace period in milliseconds for stopping workers after a failure
    #[arg(long, default_value_t = 5000)]
    grace_ms: u64,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let args = Args::parse();

    let config = PipelineConfig::new(args.workers).with_grace_period(Duration::from_millis(args.grace_ms));
    let source = Arc::new(FsSource::new(&args.extension));
    let pipeline = Pipeline::new(Arc::new(IndexStore::new()), source, config)?;
    tracing::info!(workers = args.workers, extension = %args.extension, "textdex ready");

    let format = if args.json { OutputFormat::Json } else { OutputFormat::Text };
    let shell = Shell::new(pipeline, format);
    shell.run(io::stdin().lock(), &mut io::stdout().lock())?;
    Ok(())
}
