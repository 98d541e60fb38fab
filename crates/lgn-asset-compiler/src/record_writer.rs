//! Compiled record encoding and writing.
//!
//! The fields of a record are owned by a [`RecordCodec`], selected by the
//! kind of the compiler. Codecs are registered up-front:
//!
//! ```
//! # use lgn_asset_compiler::compilers::physics::PhysicsMaterialCodec;
//! # use lgn_asset_compiler::record_writer::CodecRegistryOptions;
//! let codecs = CodecRegistryOptions::default()
//!     .add_codec(PhysicsMaterialCodec)
//!     .create();
//! assert_eq!(codecs.find("PhysicsMaterial").unwrap().extension(), ".nphys");
//! ```

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use lgn_data_block::DataBlock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::source_reader::SourceRoot;

/// Error returned when a record cannot be written.
#[derive(Error, Debug)]
pub enum WriteError {
    /// No codec is registered for the kind.
    #[error("no record codec registered for kind '{0}'")]
    CodecNotFound(String),
    /// The codec failed to produce the record.
    #[error("encoding '{0}' record failed with {1}")]
    Encode(String, #[source] lgn_data_block::Error),
    /// Filesystem failure.
    #[error("IO on '{0}' failed with {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Produces the record of one kind of compiled asset.
pub trait RecordCodec: Send + Sync {
    /// Kind of the records produced by the codec.
    fn kind(&self) -> &'static str;

    /// Extension of the record files, including the leading dot.
    fn extension(&self) -> &'static str;

    /// Builds the record from the root prim of the source document.
    fn encode(&self, root: &SourceRoot<'_>) -> Result<DataBlock, lgn_data_block::Error>;
}

/// Options used to create a [`CodecRegistry`].
#[derive(Default)]
pub struct CodecRegistryOptions {
    codecs: Vec<Box<dyn RecordCodec>>,
}

impl CodecRegistryOptions {
    /// Registers a codec. A later codec replaces an earlier one of the same
    /// kind.
    pub fn add_codec(mut self, codec: impl RecordCodec + 'static) -> Self {
        self.codecs.push(Box::new(codec));
        self
    }

    /// Creates the registry.
    pub fn create(self) -> CodecRegistry {
        let mut codecs = BTreeMap::new();
        for codec in self.codecs {
            if let Some(replaced) = codecs.insert(codec.kind(), codec) {
                warn!("record codec for kind '{}' replaced", replaced.kind());
            }
        }
        CodecRegistry { codecs }
    }
}

/// Record codecs, keyed by kind.
pub struct CodecRegistry {
    codecs: BTreeMap<&'static str, Box<dyn RecordCodec>>,
}

impl CodecRegistry {
    /// Codec registered for `kind`.
    pub fn find(&self, kind: &str) -> Option<&dyn RecordCodec> {
        self.codecs.get(kind).map(|codec| &**codec)
    }

    /// All codecs, sorted by kind.
    pub fn codecs(&self) -> impl Iterator<Item = &(dyn RecordCodec + 'static)> {
        self.codecs.values().map(|codec| &**codec)
    }
}

/// Writes `record` to `target`.
///
/// Parent directories are created as needed. The record is written to a
/// temporary file next to `target`, synced to disk and renamed into place,
/// so `target` is either left as it was or fully written.
pub fn write_record(record: &DataBlock, target: &Path) -> Result<(), WriteError> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| WriteError::Io(parent.to_owned(), e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".record")
        .tempfile_in(parent)
        .map_err(|e| WriteError::Io(parent.to_owned(), e))?;
    let written = {
        let file = temp.as_file_mut();
        file.write_all(record.to_text().as_bytes())
            .and_then(|()| file.sync_all())
    };
    written.map_err(|e| WriteError::Io(temp.path().to_owned(), e))?;
    temp.persist(target)
        .map_err(|e| WriteError::Io(target.to_owned(), e.error))?;

    debug!("wrote record '{}'", target.display());
    Ok(())
}
