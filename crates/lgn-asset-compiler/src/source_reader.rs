//! Source document access.

use std::path::{Component, Path, PathBuf};

use lgn_scene_source::{Prim, Stage, StageLoader};

use crate::CompilerError;

/// Opens the source document at `path`.
///
/// Fails with [`CompilerError::SourceLoad`] if the loader cannot open it.
pub fn open_stage(loader: &dyn StageLoader, path: &Path) -> Result<Stage, CompilerError> {
    loader
        .open(path)
        .map_err(|source| CompilerError::SourceLoad {
            path: path.to_owned(),
            source,
        })
}

/// Read accessor positioned at the root prim of a source document.
#[derive(Debug, Clone, Copy)]
pub struct SourceRoot<'a> {
    prim: &'a Prim,
}

impl<'a> SourceRoot<'a> {
    /// Locates `root_prim` in `stage`.
    ///
    /// Fails with [`CompilerError::Schema`] if the prim does not exist.
    pub fn locate(stage: &'a Stage, root_prim: &str, source_path: &str) -> Result<Self, CompilerError> {
        stage
            .prim_at_path(root_prim)
            .map(|prim| Self { prim })
            .ok_or_else(|| CompilerError::Schema {
                path: source_path.to_owned(),
                root: root_prim.to_owned(),
            })
    }

    /// Value of the string property `name`, `None` if absent or not a string.
    pub fn get_string(&self, name: &str) -> Option<&'a str> {
        self.prim.get_string(name)
    }

    /// The root prim.
    pub fn prim(&self) -> &'a Prim {
        self.prim
    }
}

/// Location of the source document to open.
///
/// Relative asset paths are relative to the project root unless they already
/// start with it.
pub fn asset_location(project_root: &Path, asset_path: &Path) -> PathBuf {
    if asset_path.is_absolute() || asset_path.starts_with(project_root) {
        asset_path.to_owned()
    } else {
        project_root.join(asset_path)
    }
}

/// Source path recorded in the catalog: the asset location relative to the
/// project root, `/` separated.
///
/// Both paths are made absolute and normalized lexically first, so every
/// spelling of the same location yields the same source path. Assets outside
/// the project root are recorded by their normalized absolute path.
pub fn relative_source_path(project_root: &Path, asset_path: &Path) -> String {
    let root = normalize(&absolute(project_root));
    let location = normalize(&absolute(&asset_location(project_root, asset_path)));
    let relative = location.strip_prefix(&root).unwrap_or(&location);

    let mut source_path = String::new();
    for component in relative.components() {
        match component {
            Component::CurDir => continue,
            Component::Prefix(prefix) => {
                source_path.push_str(&prefix.as_os_str().to_string_lossy());
                continue;
            }
            Component::RootDir => {
                source_path.push('/');
                continue;
            }
            Component::ParentDir | Component::Normal(_) => {}
        }
        if !source_path.is_empty() && !source_path.ends_with('/') {
            source_path.push('/');
        }
        source_path.push_str(&component.as_os_str().to_string_lossy());
    }
    source_path
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_owned();
    }
    std::env::current_dir().map_or_else(|_e| path.to_owned(), |cwd| cwd.join(path))
}

// resolves `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::CurDir | Component::ParentDir) | None => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
