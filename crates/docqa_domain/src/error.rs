use std::path::PathBuf;

use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Stable, machine-readable classification of an [`Error`].
///
/// Callers map these to their own status codes or user-facing hints; the
/// string forms never change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ErrorKind {
    #[strum(serialize = "validation_error")]
    Validation,
    #[strum(serialize = "file_not_found")]
    FileNotFound,
    #[strum(serialize = "unsupported_format")]
    UnsupportedFormat,
    #[strum(serialize = "index_not_found")]
    IndexNotFound,
    #[strum(serialize = "embedding_error")]
    Embedding,
    #[strum(serialize = "synthesis_error")]
    Synthesis,
    #[strum(serialize = "model_mismatch")]
    ModelMismatch,
    #[strum(serialize = "index_corruption")]
    IndexCorruption,
    #[strum(serialize = "empty_input")]
    EmptyInput,
    #[strum(serialize = "invalid_k")]
    InvalidK,
    #[strum(serialize = "storage_error")]
    Storage,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unsupported format for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("No index found for collection '{0}'")]
    IndexNotFound(String),

    #[error("Embedding request failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(#[source] anyhow::Error),

    #[error("Embedding model mismatch: index was built with '{indexed}' but '{requested}' was used")]
    ModelMismatch { indexed: String, requested: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index at {} is corrupted: {reason}", path.display())]
    IndexCorruption { path: PathBuf, reason: String },

    #[error("Nothing to index: {0}")]
    EmptyInput(String),

    #[error("top_k must be greater than zero")]
    InvalidK,

    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Error::IndexNotFound(_) => ErrorKind::IndexNotFound,
            Error::Embedding(_) => ErrorKind::Embedding,
            Error::Synthesis(_) => ErrorKind::Synthesis,
            // A vector of the wrong width means a different embedding model
            Error::ModelMismatch { .. } | Error::DimensionMismatch { .. } => {
                ErrorKind::ModelMismatch
            }
            Error::IndexCorruption { .. } => ErrorKind::IndexCorruption,
            Error::EmptyInput(_) => ErrorKind::EmptyInput,
            Error::InvalidK => ErrorKind::InvalidK,
            Error::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// True when the collection has never been ingested.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::IndexNotFound
    }

    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::UnsupportedFormat { path: path.into(), reason: reason.into() }
    }

    pub fn corruption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::IndexCorruption { path: path.into(), reason: reason.into() }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
