//! Indexer type definitions.

use thiserror::Error;

use crate::config::MatcherError;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// The configured patterns could not be compiled.
    #[error("Invalid translation file patterns: {0}")]
    Patterns(#[from] MatcherError),

    /// A file reading task panicked or was cancelled.
    #[error("Indexing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A catalog read from disk, before it becomes a salsa input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCatalog {
    pub path: std::path::PathBuf,
    pub text: String,
}
