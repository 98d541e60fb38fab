//! Asset compiler.
//!
//! Converts a scene-description source document into an engine record and
//! registers the result in the shared [`AssetCatalog`]. One compilation runs
//! these stages, each gating the next:
//!
//! * the **source reader** opens the document and locates its root prim,
//! * the **identity resolver** picks the asset's [`Uid`]: the one already
//!   catalogued for the source path, else the one embedded in the document,
//!   else a freshly generated one,
//! * the **output path composer** derives `<output>/<folder_index>/<uid><ext>`,
//! * the **record writer** encodes the record with the [`RecordCodec`]
//!   registered for the compiler's kind and writes it atomically,
//! * the catalog is updated, only once the record is on disk.
//!
//! A failed compilation leaves both the catalog and the output directory
//! untouched and reports the stage it failed at.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use lgn_asset_catalog::FileCatalog;
//! # use lgn_asset_compiler::{compilers::physics, CompileRequest};
//! # use lgn_scene_source::UsdaLoader;
//! let catalog = Arc::new(FileCatalog::new("build/catalog.index"));
//! catalog.load().unwrap();
//!
//! let compiler = physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader));
//! let meta = compiler
//!     .compile(&CompileRequest::new("build/data", "project", "materials/stone.usda", 3))
//!     .unwrap();
//! assert_eq!(meta.db_path, format!("3/{}.nphys", meta.uid));
//!
//! catalog.flush().unwrap();
//! ```
//!
//! [`AssetCatalog`]: lgn_asset_catalog::AssetCatalog
//! [`Uid`]: lgn_asset_catalog::Uid
//! [`RecordCodec`]: record_writer::RecordCodec

// crate-specific lint exceptions:
//#![allow()]

pub mod compiler_api;
pub use compiler_api::{CompileRequest, CompilerDescriptor, SourceMetaInfo};

mod errors;
pub use errors::{CompileError, CompilerError};

pub mod identity;
pub mod output_path;
pub mod record_writer;
pub mod source_reader;

mod orchestrator;
pub use orchestrator::{AssetCompiler, CompileStage};

pub mod compilers;
