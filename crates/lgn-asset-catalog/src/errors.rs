use std::path::PathBuf;

use thiserror::Error;

/// Error returned by the asset catalog.
#[derive(Error, Debug)]
pub enum Error {
    /// The catalog was used before being loaded.
    #[error("asset catalog is not loaded")]
    NotLoaded,
    /// No entry matches the lookup.
    #[error("not found")]
    NotFound,
    /// Catalog index parsing error.
    #[error("parsing '{0}' failed with {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
    /// IO error on the catalog index file.
    #[error("IO on '{0}' failed with {1}")]
    Io(PathBuf, #[source] std::io::Error),
    /// The catalog index was written by an incompatible version.
    #[error("version mismatch: found '{value}', expected '{expected}'")]
    VersionMismatch {
        /// Version found in the index file.
        value: String,
        /// Version this build supports.
        expected: String,
    },
}

/// Result type of the asset catalog.
pub type Result<T, E = Error> = std::result::Result<T, E>;
