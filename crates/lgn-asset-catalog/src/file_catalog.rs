use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AssetCatalog, AssetMetaInfo, Error, Result, Uid};

/// Current version of the catalog index format.
///
/// Changing `CATALOG_VERSION` invalidates all existing catalog index files.
pub const CATALOG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize, Debug)]
struct CatalogContent {
    version: String,
    assets: Vec<AssetMetaInfo>,
    // current uid of each source path; superseded entries stay in `assets`.
    #[serde(default)]
    sources: BTreeMap<String, Uid>,
}

#[derive(Default, Debug)]
struct CatalogState {
    assets: BTreeMap<Uid, AssetMetaInfo>,
    by_source: BTreeMap<String, Uid>,
}

impl CatalogState {
    fn from_content(content: CatalogContent) -> Self {
        let mut state = Self::default();
        for meta in content.assets {
            state.insert(meta);
        }
        for (source_path, uid) in content.sources {
            if state.assets.contains_key(&uid) {
                state.by_source.insert(source_path, uid);
            }
        }
        state
    }

    // entries are kept ordered by uid so serialization is deterministic
    fn to_content(&self) -> CatalogContent {
        CatalogContent {
            version: CATALOG_VERSION.to_owned(),
            assets: self.assets.values().cloned().collect(),
            sources: self.by_source.clone(),
        }
    }

    fn insert(&mut self, meta: AssetMetaInfo) {
        if let Some(previous) = self.assets.get(&meta.uid) {
            if previous.source_path != meta.source_path
                && self.by_source.get(&previous.source_path) == Some(&meta.uid)
            {
                self.by_source.remove(&previous.source_path);
            }
        }
        self.by_source.insert(meta.source_path.clone(), meta.uid);
        self.assets.insert(meta.uid, meta);
    }
}

/// File-backed [`AssetCatalog`].
///
/// The catalog starts unloaded. [`FileCatalog::load`] reads the index file
/// (an absent file yields an empty catalog) and [`FileCatalog::flush`] writes
/// the in-memory state back. All access goes through a reader-writer lock so
/// a single instance can be shared by concurrent compile jobs.
///
/// The index is a JSON document:
/// ```json
/// {
///   "version": "0.1.0",
///   "assets": [
///     {
///       "uid": "01234567-89ab-cdef-0123-456789abcdef",
///       "db_path": "3/01234567-89ab-cdef-0123-456789abcdef.nphys",
///       "source_path": "materials/stone.usda",
///       "dirty": false,
///       "kind": "PhysicsMaterial"
///     }
///   ],
///   "sources": {
///     "materials/stone.usda": "01234567-89ab-cdef-0123-456789abcdef"
///   }
/// }
/// ```
pub struct FileCatalog {
    index_path: Option<PathBuf>,
    state: RwLock<Option<CatalogState>>,
}

impl FileCatalog {
    /// Creates an unloaded catalog backed by `index_path`.
    pub fn new(index_path: impl AsRef<Path>) -> Self {
        Self {
            index_path: Some(index_path.as_ref().to_owned()),
            state: RwLock::new(None),
        }
    }

    /// Creates a loaded, empty catalog without a backing file.
    pub fn in_memory() -> Self {
        Self {
            index_path: None,
            state: RwLock::new(Some(CatalogState::default())),
        }
    }

    /// Path of the index file, `None` for an in-memory catalog.
    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    /// Loads the catalog content from its index file, discarding any
    /// in-memory state.
    ///
    /// A missing index file is not an error: the catalog is loaded empty and
    /// the file is created on the next [`FileCatalog::flush`].
    pub fn load(&self) -> Result<()> {
        let state = match &self.index_path {
            Some(index_path) if index_path.exists() => {
                let content = Self::read_content(index_path)?;
                CatalogState::from_content(content)
            }
            _ => CatalogState::default(),
        };

        info!(
            "loaded asset catalog {:?} with {} entries",
            self.index_path,
            state.assets.len()
        );
        *self.state.write() = Some(state);
        Ok(())
    }

    /// Drops the in-memory state. Unflushed changes are lost.
    pub fn unload(&self) {
        *self.state.write() = None;
    }

    /// Writes the catalog content to its index file.
    pub fn flush(&self) -> Result<()> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(Error::NotLoaded)?;

        let index_path = match &self.index_path {
            Some(index_path) => index_path,
            None => return Ok(()),
        };

        if let Some(parent) = index_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
            }
        }

        let file = File::create(index_path).map_err(|e| Error::Io(index_path.clone(), e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &state.to_content())
            .map_err(|e| Error::Parse(index_path.clone(), e))?;
        writer
            .flush()
            .map_err(|e| Error::Io(index_path.clone(), e))?;

        debug!(
            "flushed {} catalog entries to '{}'",
            state.assets.len(),
            index_path.display()
        );
        Ok(())
    }

    fn read_content(index_path: &Path) -> Result<CatalogContent> {
        let file = File::open(index_path).map_err(|e| Error::Io(index_path.to_owned(), e))?;
        let content: CatalogContent = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Parse(index_path.to_owned(), e))?;

        if content.version != CATALOG_VERSION {
            return Err(Error::VersionMismatch {
                value: content.version,
                expected: CATALOG_VERSION.to_owned(),
            });
        }
        Ok(content)
    }
}

impl AssetCatalog for FileCatalog {
    fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    fn find_if(&self, source_path: &str) -> Result<Uid> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(Error::NotLoaded)?;
        state
            .by_source
            .get(source_path)
            .copied()
            .ok_or(Error::NotFound)
    }

    fn find(&self, uid: Uid) -> Option<AssetMetaInfo> {
        self.state
            .read()
            .as_ref()
            .and_then(|state| state.assets.get(&uid).cloned())
    }

    fn add_or_replace(&self, meta: AssetMetaInfo) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(Error::NotLoaded)?;
        debug!("catalog entry {} -> '{}'", meta.uid, meta.db_path);
        state.insert(meta);
        Ok(())
    }

    fn len(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map_or(0, |state| state.assets.len())
    }

    fn entries(&self) -> Vec<AssetMetaInfo> {
        self.state
            .read()
            .as_ref()
            .map(|state| state.assets.values().cloned().collect())
            .unwrap_or_default()
    }
}
