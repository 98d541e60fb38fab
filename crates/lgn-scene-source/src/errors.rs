use std::path::PathBuf;

use thiserror::Error;

/// Error returned while opening or building a [`crate::Stage`].
#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be read.
    #[error("IO on '{0}' failed with {1}")]
    Io(PathBuf, #[source] std::io::Error),
    /// The document is not valid `.usda` text.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line of the offending token.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The document is in a format this reader does not handle.
    #[error("unsupported scene format '{0}'")]
    UnsupportedFormat(PathBuf),
    /// A prim path is not absolute or its parent does not exist.
    #[error("invalid prim path '{0}'")]
    InvalidPath(String),
}

/// Result type of scene source operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
