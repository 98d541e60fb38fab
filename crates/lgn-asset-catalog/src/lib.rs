//! Asset catalog of the compilation pipeline.
//!
//! The catalog records, for every compiled asset, the stable [`Uid`] it was
//! assigned and the [`AssetMetaInfo`] describing where its compiled record
//! lives. It is keyed by [`Uid`] with a secondary index on the asset's source
//! path, which is what makes identity stable across recompilations: a source
//! path that was compiled once always resolves to the same [`Uid`].
//!
//! The compiler only depends on the [`AssetCatalog`] trait. [`FileCatalog`] is
//! the file-backed implementation, with an explicit load lifecycle:
//!
//! ```no_run
//! # use lgn_asset_catalog::{AssetCatalog, FileCatalog};
//! let catalog = FileCatalog::new("build/catalog.index");
//! assert!(!catalog.is_loaded());
//! catalog.load().unwrap();
//! assert!(catalog.is_loaded());
//! ```

// crate-specific lint exceptions:
//#![allow()]

mod errors;
pub use errors::{Error, Result};

mod uid;
pub use uid::{Uid, UidParseError};

mod meta_info;
pub use meta_info::AssetMetaInfo;

mod catalog;
pub use catalog::AssetCatalog;

mod file_catalog;
pub use file_catalog::{FileCatalog, CATALOG_VERSION};
