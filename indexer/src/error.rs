use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("cannot read folder {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start indexing worker: {0}")]
    Spawn(#[source] io::Error),

    /// A worker panicked. Postings merged before the fault stay in the store.
    #[error("indexing worker {worker} failed: {message}")]
    WorkerFault { worker: usize, message: String },
}
