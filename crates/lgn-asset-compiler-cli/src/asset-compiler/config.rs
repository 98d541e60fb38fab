//! Settings of the asset compiler.
//!
//! Settings are read, in order, from:
//!
//! - built-in defaults,
//! - the closest `asset-compiler.toml` in the current directory or one of
//!   its parents,
//! - the file named by `LGN_ASSET_COMPILER_CONFIG`, if set,
//! - `LGN_ASSET_COMPILER_*` environment variables.
//!
//! A value read from a later source overrides earlier ones. Command line
//! flags override all of them. Relative paths read from a file are relative
//! to that file.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    value::magic::RelativePathBuf,
    Figment,
};
use serde::Deserialize;

/// Name of the configuration files.
pub static DEFAULT_FILENAME: &str = "asset-compiler.toml";

/// Environment variable naming an additional configuration file.
pub static CONFIG_ENV: &str = "LGN_ASSET_COMPILER_CONFIG";

static ENV_PREFIX: &str = "LGN_ASSET_COMPILER_";

const DEFAULT_FILES_PER_FOLDER: usize = 256;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub project_root: RelativePathBuf,
    pub output_dir: RelativePathBuf,
    pub catalog_path: Option<RelativePathBuf>,
    pub jobs: Option<usize>,
    pub files_per_folder: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: RelativePathBuf::from("."),
            output_dir: RelativePathBuf::from("build/data"),
            catalog_path: None,
            jobs: None,
            files_per_folder: DEFAULT_FILES_PER_FOLDER,
        }
    }
}

impl Settings {
    /// Loads the settings, looking for configuration files from
    /// `current_dir` up.
    pub fn load(current_dir: &Path) -> figment::error::Result<Self> {
        let mut figment = Figment::new();

        for dir in current_dir.ancestors() {
            let config_file_path = dir.join(DEFAULT_FILENAME);
            if config_file_path.is_file() {
                figment = figment.merge(Toml::file(config_file_path));
                break;
            }
        }

        if let Some(config_file_path) = std::env::var_os(CONFIG_ENV) {
            figment = figment.merge(Toml::file(config_file_path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
            .extract()
    }

    pub fn project_root(&self) -> PathBuf {
        self.project_root.relative()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.relative()
    }

    /// Catalog index file, `catalog.index` in the output directory unless
    /// configured.
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path.as_ref().map_or_else(
            || self.output_dir().join("catalog.index"),
            RelativePathBuf::relative,
        )
    }

    /// Number of compile workers, the available parallelism unless
    /// configured.
    pub fn jobs(&self) -> usize {
        self.jobs.filter(|jobs| *jobs > 0).unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }

    /// Sharding index of the `position`-th compiled source.
    pub fn folder_index(&self, position: usize) -> u32 {
        u32::try_from(position / self.files_per_folder.max(1)).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults() {
        Jail::expect_with(|jail| {
            let settings = Settings::load(jail.directory())?;

            assert_eq!(settings.project_root(), Path::new("."));
            assert_eq!(settings.output_dir(), Path::new("build/data"));
            assert_eq!(
                settings.catalog_path(),
                Path::new("build/data").join("catalog.index")
            );
            assert!(settings.jobs() >= 1);
            assert_eq!(settings.files_per_folder, DEFAULT_FILES_PER_FOLDER);
            Ok(())
        });
    }

    #[test]
    fn closest_file_relative_paths() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_FILENAME,
                r#"
                project_root = "project"
                output_dir = "out"
                catalog_path = "out/assets.index"
                jobs = 3
                files_per_folder = 2
                "#,
            )?;
            let nested = jail.directory().join("project").join("materials");
            std::fs::create_dir_all(&nested).map_err(|e| e.to_string())?;

            let settings = Settings::load(&nested)?;
            assert_eq!(settings.project_root(), jail.directory().join("project"));
            assert_eq!(settings.output_dir(), jail.directory().join("out"));
            assert_eq!(
                settings.catalog_path(),
                jail.directory().join("out/assets.index")
            );
            assert_eq!(settings.jobs(), 3);
            assert_eq!(settings.folder_index(0), 0);
            assert_eq!(settings.folder_index(1), 0);
            assert_eq!(settings.folder_index(5), 2);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_FILENAME, "jobs = 3\nfiles_per_folder = 2")?;
            jail.create_file("custom.toml", "files_per_folder = 10")?;
            jail.set_env(CONFIG_ENV, "custom.toml");
            jail.set_env("LGN_ASSET_COMPILER_JOBS", "8");

            let settings = Settings::load(jail.directory())?;
            assert_eq!(settings.jobs(), 8);
            assert_eq!(settings.files_per_folder, 10);
            Ok(())
        });
    }

    #[test]
    fn invalid_value() {
        Jail::expect_with(|jail| {
            jail.set_env("LGN_ASSET_COMPILER_JOBS", "many");
            assert!(Settings::load(jail.directory()).is_err());
            Ok(())
        });
    }
}
