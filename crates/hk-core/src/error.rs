use std::path::{Path, PathBuf};

/// Failure reading or writing one of the persisted files.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, source: serde_json::Error) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors surfaced by shopping-list operations.
#[derive(thiserror::Error, Debug)]
pub enum ListError {
    /// Client input error: the note text or its source label is empty.
    #[error("Missing item or source")]
    MissingField,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
