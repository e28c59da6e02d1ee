//! Error types for rbxfs-tree

use std::path::PathBuf;

/// Result type for rbxfs-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rbxfs-tree operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot parent object to itself or one of its descendants")]
    CircularReference,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse class catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
