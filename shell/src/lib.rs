//! Line-oriented front end: reads `index` / `search` / `quit` commands and
//! prints their results as text or JSON lines.

use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use textdex_core::{search, IndexStore, Query, SearchHit};
use textdex_indexer::{IndexStats, Pipeline};

pub mod command;

pub use command::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Reply<'a> {
    Indexed { stats: &'a IndexStats, documents: usize },
    NoFiles { folder: &'a str },
    IndexFailed { message: String },
    Results { hits: &'a [SearchHit] },
    Usage { message: String },
    Unknown { input: &'a str },
    Quit,
}

pub struct Shell {
    pipeline: Pipeline,
    format: OutputFormat,
}

impl Shell {
    pub fn new(pipeline: Pipeline, format: OutputFormat) -> Self {
        Self { pipeline, format }
    }

    pub fn store(&self) -> &Arc<IndexStore> { self.pipeline.store() }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> io::Result<()> {
        self.prompt(out)?;
        for line in input.lines() {
            if !self.execute(&line?, out)? {
                return Ok(());
            }
            self.prompt(out)?;
        }
        Ok(())
    }

    /// Run one command line. Returns `false` once the shell should stop.
    pub fn execute<W: Write>(&self, line: &str, out: &mut W) -> io::Result<bool> {
        match Command::parse(line) {
            Command::Empty => {}
            Command::Quit => {
                self.reply(out, &Reply::Quit)?;
                return Ok(false);
            }
            Command::Index(folder) => match self.pipeline.index_folder(Path::new(&folder)) {
                Ok(stats) if stats.is_empty() => self.reply(out, &Reply::NoFiles { folder: &folder })?,
                Ok(stats) => {
                    let documents = self.store().document_count();
                    self.reply(out, &Reply::Indexed { stats: &stats, documents })?
                }
                Err(e) => {
                    tracing::error!(folder = %folder, error = %e, "indexing failed");
                    self.reply(out, &Reply::IndexFailed { message: e.to_string() })?
                }
            },
            Command::Search(text) => match Query::parse(&text) {
                Ok(query) => {
                    let hits = search(self.store(), &query);
                    self.reply(out, &Reply::Results { hits: &hits })?
                }
                Err(e) => self.reply(out, &Reply::Usage { message: e.to_string() })?,
            },
            Command::Unknown(input) => self.reply(out, &Reply::Unknown { input: &input })?,
        }
        Ok(true)
    }

    fn prompt<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.format == OutputFormat::Text {
            write!(out, "> ")?;
            out.flush()?;
        }
        Ok(())
    }

    fn reply<W: Write>(&self, out: &mut W, reply: &Reply<'_>) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            serde_json::to_writer(&mut *out, reply)?;
            return writeln!(out);
        }
        match reply {
            Reply::Indexed { stats, documents } => writeln!(
                out,
                "Indexed {} files in {:.3} s ({:.3} MB/s, {} workers); {} documents in index.",
                stats.file_count, stats.elapsed_secs, stats.throughput_mbps, stats.workers, documents
            ),
            Reply::NoFiles { folder } => writeln!(out, "No matching files found in {folder}."),
            Reply::IndexFailed { message } => writeln!(out, "Indexing failed: {message}"),
            Reply::Results { hits } if hits.is_empty() => writeln!(out, "No documents match the query."),
            Reply::Results { hits } => {
                writeln!(out, "Top results:")?;
                for (rank, hit) in hits.iter().enumerate() {
                    writeln!(out, "{}. [{}] {}", rank + 1, hit.score, hit.path)?;
                }
                Ok(())
            }
            Reply::Usage { message } => writeln!(out, "{message}. Example: search cats AND dogs"),
            Reply::Unknown { input } => writeln!(
                out,
                "Unknown command '{input}'. Supported: index <folder>, search <term> [AND <term> ...], quit"
            ),
            Reply::Quit => writeln!(out, "Bye."),
        }
    }
}
