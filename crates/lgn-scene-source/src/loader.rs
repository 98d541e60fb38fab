use std::path::Path;

use crate::{Error, Result, Stage};

/// Opens scene-description documents by path.
pub trait StageLoader: Send + Sync {
    /// Opens the document at `path`.
    fn open(&self, path: &Path) -> Result<Stage>;
}

/// [`StageLoader`] for `.usda` text documents.
#[derive(Default, Debug, Clone, Copy)]
pub struct UsdaLoader;

impl UsdaLoader {
    const EXTENSIONS: &'static [&'static str] = &["usda", "usd"];
}

impl StageLoader for UsdaLoader {
    fn open(&self, path: &Path) -> Result<Stage> {
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                Self::EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            });
        if !supported {
            return Err(Error::UnsupportedFormat(path.to_owned()));
        }
        Stage::open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_usda() {
        let work_dir = tempfile::tempdir().unwrap();
        let path = work_dir.path().join("stone.usda");
        std::fs::write(&path, "#usda 1.0\ndef Xform \"Root\"\n{\n}\n").unwrap();

        let stage = UsdaLoader.open(&path).unwrap();
        assert!(stage.prim_at_path("/Root").is_some());
    }

    #[test]
    fn reject_other_extensions() {
        let work_dir = tempfile::tempdir().unwrap();
        let path = work_dir.path().join("stone.fbx");
        std::fs::write(&path, "#usda 1.0\n").unwrap();

        assert!(matches!(
            UsdaLoader.open(&path),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
