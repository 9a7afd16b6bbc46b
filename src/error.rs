//! Error types for the takeout library

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for export operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error while producing an artifact
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path of the artifact involved
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: io::Error,
    },

    /// The output root is already claimed by a running export
    #[error("output directory busy: {}", .0.display())]
    OutputBusy(PathBuf),

    /// A call was made outside the required protocol order
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Encoder nesting state became inconsistent
    #[error("encoder invariant violated: {0}")]
    Invariant(String),

    /// The writer was used after an earlier operation failed
    #[error("writer poisoned by an earlier failure")]
    Poisoned,
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Build an IO error carrying the artifact path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a protocol violation error
    pub fn protocol(message: impl Into<String>) -> Self {
        ExportError::Protocol(message.into())
    }

    /// Build an encoder invariant error
    pub fn invariant(message: impl Into<String>) -> Self {
        ExportError::Invariant(message.into())
    }

    /// Path of the artifact involved, if the failure names one
    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportError::Io { path, .. } => Some(path),
            ExportError::OutputBusy(path) => Some(path),
            _ => None,
        }
    }

    /// Whether this failure is a caller-side contract violation
    pub fn is_protocol(&self) -> bool {
        matches!(self, ExportError::Protocol(_) | ExportError::Poisoned)
    }
}
