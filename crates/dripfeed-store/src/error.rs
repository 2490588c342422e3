use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The document exists but does not parse as the expected shape.
    #[error("corrupt state in {}: {source}", path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading, writing, or renaming the document failed.
    #[error("persistence failure on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Short error code string returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::CorruptState { .. } => "CORRUPT_STATE",
            StoreError::Persistence { .. } => "PERSISTENCE_FAILURE",
            StoreError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Persistence {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
