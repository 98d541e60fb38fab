//! Physics material compiler.
//!
//! Reads the `/Root` prim of a physics material document and writes a
//! `PhysicsMaterial` record with the `.nphys` extension. The record only
//! carries a placeholder field for now.

use std::sync::Arc;

use lgn_asset_catalog::AssetCatalog;
use lgn_data_block::DataBlock;
use lgn_scene_source::StageLoader;

use crate::{
    record_writer::{CodecRegistryOptions, RecordCodec},
    source_reader::SourceRoot,
    AssetCompiler, CompilerDescriptor,
};

/// Kind of physics material records.
pub const PHYSICS_MATERIAL_KIND: &str = "PhysicsMaterial";

/// Extension of physics material records.
pub const PHYSICS_MATERIAL_EXTENSION: &str = ".nphys";

/// Descriptor of the physics material compiler.
pub static COMPILER_INFO: CompilerDescriptor = CompilerDescriptor {
    name: "physics-material",
    kind: PHYSICS_MATERIAL_KIND,
    root_prim: "/Root",
    uid_property: "uid",
};

/// Codec of `PhysicsMaterial` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsMaterialCodec;

impl RecordCodec for PhysicsMaterialCodec {
    fn kind(&self) -> &'static str {
        PHYSICS_MATERIAL_KIND
    }

    fn extension(&self) -> &'static str {
        PHYSICS_MATERIAL_EXTENSION
    }

    fn encode(&self, _root: &SourceRoot<'_>) -> Result<DataBlock, lgn_data_block::Error> {
        let mut record = DataBlock::new();
        record.set_str("dummy", "dummyPhys")?;
        Ok(record)
    }
}

/// Codecs of the compilers in this crate.
pub fn codecs() -> CodecRegistryOptions {
    CodecRegistryOptions::default().add_codec(PhysicsMaterialCodec)
}

/// Creates the physics material compiler.
pub fn asset_compiler(
    catalog: Arc<dyn AssetCatalog>,
    loader: Arc<dyn StageLoader>,
) -> AssetCompiler {
    AssetCompiler::new(&COMPILER_INFO, catalog, loader, Arc::new(codecs().create()))
}

#[cfg(test)]
mod tests {
    use lgn_scene_source::Stage;

    use super::*;

    #[test]
    fn placeholder_record() {
        let mut stage = Stage::new();
        stage.define_prim("/Root", "Material").unwrap();
        let root = SourceRoot::locate(&stage, "/Root", "stone.usda").unwrap();

        let record = PhysicsMaterialCodec.encode(&root).unwrap();
        assert_eq!(record.to_text(), "dummy:t=\"dummyPhys\"\n");
    }
}
