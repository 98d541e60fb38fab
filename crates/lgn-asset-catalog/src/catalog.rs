use crate::{AssetMetaInfo, Result, Uid};

/// Shared, mutable catalog of compiled assets.
///
/// Implementations synchronize internally: a single instance is shared by
/// all compile jobs running concurrently and every method takes `&self`.
pub trait AssetCatalog: Send + Sync {
    /// Returns `true` once the catalog content is available.
    fn is_loaded(&self) -> bool;

    /// Finds the id associated with `source_path`.
    ///
    /// Returns [`crate::Error::NotFound`] if the source path was never
    /// registered and [`crate::Error::NotLoaded`] if the catalog is not loaded.
    fn find_if(&self, source_path: &str) -> Result<Uid>;

    /// Returns the entry registered for `uid`.
    fn find(&self, uid: Uid) -> Option<AssetMetaInfo>;

    /// Inserts `meta` or replaces the entry registered for `meta.uid`.
    fn add_or_replace(&self, meta: AssetMetaInfo) -> Result<()>;

    /// Number of registered entries.
    fn len(&self) -> usize;

    /// Returns `true` if no entry is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, sorted by id.
    fn entries(&self) -> Vec<AssetMetaInfo>;
}
