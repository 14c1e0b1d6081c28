//! Folder ingestion for the textdex index: discovers documents, deals them
//! out to a worker group and merges their term frequencies into a shared
//! [`textdex_core::IndexStore`].

pub mod error;
pub mod pipeline;
pub mod source;

pub use error::IndexError;
pub use pipeline::{partition_round_robin, IndexStats, Pipeline, PipelineConfig};
pub use source::{DocumentSource, FsSource};
