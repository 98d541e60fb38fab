use std::path::PathBuf;

use lgn_asset_catalog::UidParseError;
use thiserror::Error;

use crate::{record_writer::WriteError, CompileStage};

/// Reason a compilation failed.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// The catalog was not loaded when the compilation started.
    #[error("asset catalog is not loaded")]
    CatalogNotReady,
    /// The source document could not be opened or parsed.
    #[error("failed to load source document '{path}'")]
    SourceLoad {
        /// Location of the document.
        path: PathBuf,
        /// Underlying loader error.
        #[source]
        source: lgn_scene_source::Error,
    },
    /// The source document has no root prim.
    #[error("source document '{path}' has no prim '{root}'")]
    Schema {
        /// Source path of the document.
        path: String,
        /// Expected root prim.
        root: String,
    },
    /// The uid embedded in the source document cannot be parsed.
    #[error("embedded uid '{value}' is invalid")]
    InvalidUidFormat {
        /// Embedded value.
        value: String,
        /// Parse failure.
        #[source]
        source: UidParseError,
    },
    /// The compiled record could not be encoded or written.
    #[error(transparent)]
    Write(#[from] WriteError),
    /// The catalog rejected a lookup or an update.
    #[error("asset catalog failure")]
    Catalog(#[source] lgn_asset_catalog::Error),
}

impl CompilerError {
    /// Returns `true` if the same compilation may succeed when retried
    /// without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CatalogNotReady | Self::Write(_))
    }
}

/// Failed compilation: the failing stage, the asset and the reason.
#[derive(Error, Debug)]
#[error("compiling '{source_path}' failed while {stage}")]
pub struct CompileError {
    /// Stage the compilation was in when it failed.
    pub stage: CompileStage,
    /// Source path of the asset, relative to the project root.
    pub source_path: String,
    /// Failure reason.
    #[source]
    pub error: CompilerError,
}

impl CompileError {
    /// See [`CompilerError::is_retryable`].
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}
