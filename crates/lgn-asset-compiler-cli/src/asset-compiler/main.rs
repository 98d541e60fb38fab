// crate-specific lint exceptions:
//#![allow()]

mod config;
mod jobs;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::{AppSettings, Parser, Subcommand};
use lgn_asset_catalog::{AssetCatalog, FileCatalog};
use lgn_asset_compiler::{compilers::physics, CompileRequest};
use lgn_scene_source::UsdaLoader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[clap(name = "Asset Compiler")]
#[clap(about = "Compiles scene-description assets into engine records", version, author)]
#[clap(setting(AppSettings::ArgRequiredElseHelp))]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile source assets and register them in the catalog
    #[clap(name = "compile")]
    Compile {
        /// Source documents to compile.
        #[clap(required = true)]
        sources: Vec<PathBuf>,
        /// Source project root.
        #[clap(long)]
        project: Option<PathBuf>,
        /// Root directory of the compiled records.
        #[clap(long)]
        output: Option<PathBuf>,
        /// Catalog index file.
        #[clap(long)]
        catalog: Option<PathBuf>,
        /// Write every record in this folder.
        #[clap(long, conflicts_with = "files_per_folder")]
        folder_index: Option<u32>,
        /// Number of records per folder.
        #[clap(long)]
        files_per_folder: Option<usize>,
        /// Number of compile workers.
        #[clap(long, short)]
        jobs: Option<usize>,
    },
    /// List the catalog entries
    #[clap(name = "catalog")]
    Catalog {
        /// Catalog index file.
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
    /// List the record codecs
    #[clap(name = "info")]
    Info,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let current_dir = std::env::current_dir().context("reading current directory")?;
    let mut settings = Settings::load(&current_dir).context("loading settings")?;

    match args.command {
        Commands::Compile {
            sources,
            project,
            output,
            catalog,
            folder_index,
            files_per_folder,
            jobs,
        } => {
            if let Some(project) = project {
                settings.project_root = project.into();
            }
            if let Some(output) = output {
                settings.output_dir = output.into();
            }
            if let Some(catalog) = catalog {
                settings.catalog_path = Some(catalog.into());
            }
            if let Some(files_per_folder) = files_per_folder {
                settings.files_per_folder = files_per_folder;
            }
            if jobs.is_some() {
                settings.jobs = jobs;
            }
            compile(&settings, sources, folder_index)
        }
        Commands::Catalog { catalog } => {
            let catalog_path = catalog.unwrap_or_else(|| settings.catalog_path());
            list_catalog(catalog_path)
        }
        Commands::Info => {
            println!("{:<20} extension", "kind");
            for codec in physics::codecs().create().codecs() {
                println!("{:<20} {}", codec.kind(), codec.extension());
            }
            Ok(())
        }
    }
}

fn compile(
    settings: &Settings,
    sources: Vec<PathBuf>,
    folder_index: Option<u32>,
) -> anyhow::Result<()> {
    let catalog_path = settings.catalog_path();
    let catalog = Arc::new(FileCatalog::new(&catalog_path));
    catalog
        .load()
        .with_context(|| format!("loading catalog '{}'", catalog_path.display()))?;

    let compiler = physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader));

    let project_root = settings.project_root();
    let output_dir = settings.output_dir();
    let requests = sources
        .into_iter()
        .enumerate()
        .map(|(position, source)| {
            let folder_index = folder_index.unwrap_or_else(|| settings.folder_index(position));
            CompileRequest::new(&output_dir, &project_root, source, folder_index)
        })
        .collect::<Vec<_>>();
    let total = requests.len();

    let mut failed = 0;
    for result in jobs::compile_all(&compiler, requests, settings.jobs()) {
        match result {
            Ok(meta) => println!("{}  {} -> {}", meta.uid, meta.source_path, meta.db_path),
            Err(err) => {
                failed += 1;
                eprintln!("error: {:#}", anyhow::Error::new(err));
            }
        }
    }

    catalog
        .flush()
        .with_context(|| format!("writing catalog '{}'", catalog_path.display()))?;
    info!(
        "compiled {} of {} assets, catalog has {} entries",
        total - failed,
        total,
        catalog.len()
    );

    if failed > 0 {
        bail!("{} of {} assets failed to compile", failed, total);
    }
    Ok(())
}

fn list_catalog(catalog_path: PathBuf) -> anyhow::Result<()> {
    let catalog = FileCatalog::new(&catalog_path);
    catalog
        .load()
        .with_context(|| format!("loading catalog '{}'", catalog_path.display()))?;

    for meta in catalog.entries() {
        println!(
            "{}  {:<16} {}  {}{}",
            meta.uid,
            meta.kind,
            meta.db_path,
            meta.source_path,
            if meta.dirty { " (dirty)" } else { "" }
        );
    }
    Ok(())
}
