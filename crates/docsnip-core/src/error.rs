use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Failed to read manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local source could not be read.
    #[error("Failed to load '{id}': {source}")]
    Load {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// A remote source could not be fetched or yielded no text.
    #[error("Failed to fetch '{id}': {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },
}

/// Failure modes of a URL fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("extraction returned no text")]
    EmptyExtraction,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, Error>;
