//! Identity resolution.
//!
//! The catalog is authoritative: once a source path has been compiled, its
//! uid never changes, whatever the document embeds. The embedded uid is only
//! used for assets the catalog has never seen, and a new uid is generated
//! when there is none.

use lgn_asset_catalog::{AssetCatalog, Error as CatalogError, Uid};
use tracing::debug;

use crate::CompilerError;

/// Resolves the uid of the asset at `source_path`.
///
/// `embedded` is the uid read from the document, if any. Empty or
/// whitespace-only values count as absent; any other value that does not
/// parse fails with [`CompilerError::InvalidUidFormat`].
pub fn resolve_uid(
    catalog: &dyn AssetCatalog,
    source_path: &str,
    embedded: Option<&str>,
) -> Result<Uid, CompilerError> {
    match catalog.find_if(source_path) {
        Ok(uid) => {
            debug!("'{}' is catalogued as {}", source_path, uid);
            return Ok(uid);
        }
        Err(CatalogError::NotFound) => {}
        Err(CatalogError::NotLoaded) => return Err(CompilerError::CatalogNotReady),
        Err(err) => return Err(CompilerError::Catalog(err)),
    }

    match embedded.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            let uid = value
                .parse::<Uid>()
                .map_err(|source| CompilerError::InvalidUidFormat {
                    value: value.to_owned(),
                    source,
                })?;
            debug!("'{}' uses embedded uid {}", source_path, uid);
            Ok(uid)
        }
        None => {
            let uid = Uid::generate();
            debug!("'{}' assigned new uid {}", source_path, uid);
            Ok(uid)
        }
    }
}
