//! Compiler descriptors and compile requests.

use std::path::PathBuf;

/// Static description of an asset compiler.
///
/// ```
/// # use lgn_asset_compiler::CompilerDescriptor;
/// static COMPILER_INFO: CompilerDescriptor = CompilerDescriptor {
///     name: "terrain-layer",
///     kind: "TerrainLayer",
///     root_prim: "/Root",
///     uid_property: "uid",
/// };
/// ```
#[derive(Debug)]
pub struct CompilerDescriptor {
    /// Compiler name, used in logs.
    pub name: &'static str,
    /// Kind of the produced records. Selects the record codec and is stored
    /// in the catalog entries.
    pub kind: &'static str,
    /// Path of the prim holding the asset's properties.
    pub root_prim: &'static str,
    /// Name of the string property that may carry an embedded uid.
    pub uid_property: &'static str,
}

/// Metadata describing the source asset of a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMetaInfo {
    /// Location of the source document. Relative paths are resolved against
    /// the project root.
    pub asset_path: PathBuf,
}

/// Arguments of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Root directory of the compiled records.
    pub output_path: PathBuf,
    /// Root directory of the source project.
    pub project_root: PathBuf,
    /// Source asset.
    pub meta: SourceMetaInfo,
    /// Sharding index: the record is written to `output_path/<folder_index>/`.
    pub folder_index: u32,
}

impl CompileRequest {
    /// Creates a request compiling `asset_path`.
    pub fn new(
        output_path: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        asset_path: impl Into<PathBuf>,
        folder_index: u32,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            project_root: project_root.into(),
            meta: SourceMetaInfo {
                asset_path: asset_path.into(),
            },
            folder_index,
        }
    }
}
