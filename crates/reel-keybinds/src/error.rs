//! Key binding error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a binding file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read at all.
    #[error("Cannot read binding file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exceeds the line cap; nothing was loaded.
    #[error("Binding file {path} has more than {max} lines")]
    TooManyLines { path: PathBuf, max: usize },
}

/// Errors that can occur while writing a binding file.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The file was opened read-only.
    #[error("Binding file {0} is read-only")]
    ReadOnly(PathBuf),

    /// The write itself failed.
    #[error("Cannot write binding file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Persisting the mutation failed; memory state was left untouched.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Reloading from disk failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
