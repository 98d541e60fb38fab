use serde::{Deserialize, Serialize};

use crate::Uid;

/// A catalog entry describing one compiled asset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetMetaInfo {
    /// Stable identifier of the compiled asset.
    pub uid: Uid,
    /// Location of the compiled record, relative to the output root, i.e.:
    /// "3/01234567-89ab-cdef-0123-456789abcdef.nphys"
    pub db_path: String,
    /// Path of the source asset, relative to the project root.
    pub source_path: String,
    /// Set until the compiled record has been written.
    pub dirty: bool,
    /// Discriminator of the compiled record's format, i.e. "PhysicsMaterial".
    pub kind: String,
}

impl AssetMetaInfo {
    /// Creates a dirty entry not yet bound to a compiled record.
    pub fn new(uid: Uid, source_path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            uid,
            db_path: String::new(),
            source_path: source_path.into(),
            dirty: true,
            kind: kind.into(),
        }
    }
}
