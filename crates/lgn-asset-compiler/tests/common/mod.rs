use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use lgn_asset_catalog::FileCatalog;
use lgn_asset_compiler::{compilers::physics, AssetCompiler};
use lgn_scene_source::UsdaLoader;

pub fn setup_dir(work_dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let project_dir = work_dir.path().join("project");
    let output_dir = work_dir.path().join("output");
    fs::create_dir_all(&project_dir).unwrap();
    (project_dir, output_dir)
}

pub fn write_source(project_dir: &Path, source_path: &str, uid: Option<&str>) -> PathBuf {
    let uid_property = uid
        .map(|uid| format!("    string uid = \"{}\"\n", uid))
        .unwrap_or_default();
    let content = format!(
        r#"#usda 1.0
(
    defaultPrim = "Root"
)

def Material "Root"
{{
{}    float physics:density = 2.5
    float physics:dynamicFriction = 0.6
}}
"#,
        uid_property
    );

    let path = project_dir.join(source_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

pub fn loaded_catalog(work_dir: &tempfile::TempDir) -> Arc<FileCatalog> {
    let catalog = FileCatalog::new(work_dir.path().join("catalog.index"));
    catalog.load().expect("catalog loaded");
    Arc::new(catalog)
}

pub fn physics_compiler(catalog: &Arc<FileCatalog>) -> AssetCompiler {
    physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader))
}

pub fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
