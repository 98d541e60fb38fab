use std::{fmt, fs, sync::Arc};

use lgn_asset_catalog::{AssetCatalog, AssetMetaInfo};
use lgn_scene_source::{Stage, StageLoader};
use tracing::{debug, info, warn};

use crate::{
    identity::resolve_uid,
    output_path::{compose, db_path},
    record_writer::{write_record, CodecRegistry, WriteError},
    source_reader::{asset_location, open_stage, relative_source_path, SourceRoot},
    CompileError, CompileRequest, CompilerDescriptor, CompilerError,
};

/// Stages of a compilation.
///
/// A compilation starts `Idle` and moves forward one stage at a time until
/// `Done`. Any failure moves it to `Failed`. Nothing outside of the compiler
/// is modified before `Writing` succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileStage {
    /// Not started. The catalog must be loaded to leave this stage.
    Idle,
    /// Opening the source document and locating its root prim.
    Loading,
    /// Resolving the asset's uid.
    ExtractingIdentity,
    /// Selecting the record codec and composing the output location.
    ComposingOutput,
    /// Writing the compiled record.
    Writing,
    /// Registering the asset in the catalog.
    Updating,
    /// Compiled.
    Done,
    /// Failed.
    Failed,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::ExtractingIdentity => "extracting identity",
            Self::ComposingOutput => "composing output",
            Self::Writing => "writing",
            Self::Updating => "updating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct CompileJob<'a> {
    compiler: &'static str,
    source_path: &'a str,
    stage: CompileStage,
}

impl<'a> CompileJob<'a> {
    fn new(compiler: &'static str, source_path: &'a str) -> Self {
        Self {
            compiler,
            source_path,
            stage: CompileStage::Idle,
        }
    }

    fn enter(&mut self, stage: CompileStage) {
        debug!(
            "{}: '{}' {} -> {}",
            self.compiler, self.source_path, self.stage, stage
        );
        self.stage = stage;
    }

    fn fail(&mut self, error: CompilerError) -> CompileError {
        let stage = self.stage;
        self.enter(CompileStage::Failed);
        warn!(
            "{}: '{}' failed while {}: {}",
            self.compiler, self.source_path, stage, error
        );
        CompileError {
            stage,
            source_path: self.source_path.to_owned(),
            error,
        }
    }
}

/// Compiles source documents of one kind and records them in a catalog.
///
/// A compiler is shared by concurrent jobs: every compilation only needs
/// `&self`, and the catalog synchronizes its own access.
pub struct AssetCompiler {
    descriptor: &'static CompilerDescriptor,
    catalog: Arc<dyn AssetCatalog>,
    loader: Arc<dyn StageLoader>,
    codecs: Arc<CodecRegistry>,
}

impl AssetCompiler {
    /// Creates a compiler writing records of `descriptor.kind` with the
    /// matching codec of `codecs`.
    pub fn new(
        descriptor: &'static CompilerDescriptor,
        catalog: Arc<dyn AssetCatalog>,
        loader: Arc<dyn StageLoader>,
        codecs: Arc<CodecRegistry>,
    ) -> Self {
        Self {
            descriptor,
            catalog,
            loader,
            codecs,
        }
    }

    /// Descriptor of the compiler.
    pub fn descriptor(&self) -> &'static CompilerDescriptor {
        self.descriptor
    }

    /// Catalog updated by the compiler.
    pub fn catalog(&self) -> &Arc<dyn AssetCatalog> {
        &self.catalog
    }

    /// Record codecs available to the compiler.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Compiles the source document of `request`.
    ///
    /// On success, exactly one record was written at
    /// `output_path/<folder_index>/<uid><ext>` and the returned entry was
    /// registered in the catalog. On failure neither the output directory nor
    /// the catalog were modified.
    pub fn compile(&self, request: &CompileRequest) -> Result<AssetMetaInfo, CompileError> {
        let source_path = relative_source_path(&request.project_root, &request.meta.asset_path);
        let mut job = CompileJob::new(self.descriptor.name, &source_path);

        if !self.catalog.is_loaded() {
            return Err(job.fail(CompilerError::CatalogNotReady));
        }
        job.enter(CompileStage::Loading);

        let location = asset_location(&request.project_root, &request.meta.asset_path);
        let stage = open_stage(self.loader.as_ref(), &location).map_err(|e| job.fail(e))?;

        self.compile_loaded(&mut job, &stage, request)
    }

    /// Compiles an already opened source document. `request` still names the
    /// document's asset path, from which its source path is derived.
    pub fn compile_document(
        &self,
        stage: &Stage,
        request: &CompileRequest,
    ) -> Result<AssetMetaInfo, CompileError> {
        let source_path = relative_source_path(&request.project_root, &request.meta.asset_path);
        let mut job = CompileJob::new(self.descriptor.name, &source_path);

        if !self.catalog.is_loaded() {
            return Err(job.fail(CompilerError::CatalogNotReady));
        }
        job.enter(CompileStage::Loading);

        self.compile_loaded(&mut job, stage, request)
    }

    fn compile_loaded(
        &self,
        job: &mut CompileJob<'_>,
        stage: &Stage,
        request: &CompileRequest,
    ) -> Result<AssetMetaInfo, CompileError> {
        let source_path = job.source_path;
        let root = SourceRoot::locate(stage, self.descriptor.root_prim, source_path)
            .map_err(|e| job.fail(e))?;

        job.enter(CompileStage::ExtractingIdentity);
        let embedded = root.get_string(self.descriptor.uid_property);
        let uid = resolve_uid(self.catalog.as_ref(), source_path, embedded)
            .map_err(|e| job.fail(e))?;

        job.enter(CompileStage::ComposingOutput);
        let codec = self
            .codecs
            .find(self.descriptor.kind)
            .ok_or_else(|| WriteError::CodecNotFound(self.descriptor.kind.to_owned()))
            .map_err(|e| job.fail(e.into()))?;
        let mut meta = AssetMetaInfo::new(uid, source_path, self.descriptor.kind);
        meta.db_path = db_path(request.folder_index, uid, codec.extension());
        let target = compose(
            &request.output_path,
            request.folder_index,
            uid,
            codec.extension(),
        );

        job.enter(CompileStage::Writing);
        let record = codec
            .encode(&root)
            .map_err(|e| WriteError::Encode(source_path.to_owned(), e))
            .map_err(|e| job.fail(e.into()))?;
        let replaces_record = target.exists();
        write_record(&record, &target).map_err(|e| job.fail(e.into()))?;
        meta.dirty = false;

        job.enter(CompileStage::Updating);
        if let Err(err) = self.catalog.add_or_replace(meta.clone()) {
            if !replaces_record {
                if let Err(e) = fs::remove_file(&target) {
                    warn!("failed to remove '{}': {}", target.display(), e);
                }
            }
            return Err(job.fail(CompilerError::Catalog(err)));
        }

        job.enter(CompileStage::Done);
        info!(
            "{}: compiled '{}' to '{}'",
            self.descriptor.name, source_path, meta.db_path
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use lgn_asset_catalog::{FileCatalog, Uid};
    use lgn_scene_source::{UsdaLoader, Value};

    use super::*;
    use crate::compilers::physics;

    const UID: &str = "6f2a7d0c-6a47-4ad5-9e0b-7e1b0f3c2d41";

    fn stage_with_uid(uid: &str) -> Stage {
        let mut stage = Stage::new();
        stage
            .define_prim("/Root", "Material")
            .unwrap()
            .set("uid", Value::String(uid.to_owned()));
        stage
    }

    #[test]
    fn stage_names() {
        assert_eq!(CompileStage::ExtractingIdentity.to_string(), "extracting identity");
        assert_eq!(CompileStage::Failed.to_string(), "failed");
    }

    #[test]
    fn compile_document() {
        let work_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FileCatalog::in_memory());
        let compiler = physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader));

        let request = CompileRequest::new(work_dir.path(), "project", "project/stone.usda", 1);
        let meta = compiler
            .compile_document(&stage_with_uid(UID), &request)
            .unwrap();

        assert_eq!(meta.uid.to_string(), UID);
        assert_eq!(meta.source_path, "stone.usda");
        assert_eq!(meta.db_path, format!("1/{}.nphys", UID));
        assert!(!meta.dirty);
        assert_eq!(catalog.find(meta.uid), Some(meta.clone()));
        assert!(work_dir.path().join(&meta.db_path).exists());
    }

    #[test]
    fn failure_reports_stage() {
        let work_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FileCatalog::in_memory());
        let compiler = physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader));
        let request = CompileRequest::new(work_dir.path(), "project", "stone.usda", 0);

        let err = compiler
            .compile_document(&stage_with_uid("bad"), &request)
            .unwrap_err();
        assert_eq!(err.stage, CompileStage::ExtractingIdentity);
        assert_eq!(err.source_path, "stone.usda");
        assert!(!err.is_retryable());
        assert!(catalog.is_empty());

        let err = compiler.compile_document(&Stage::new(), &request).unwrap_err();
        assert_eq!(err.stage, CompileStage::Loading);
        assert!(matches!(err.error, CompilerError::Schema { .. }));
    }

    #[test]
    fn missing_codec() {
        static UNKNOWN: CompilerDescriptor = CompilerDescriptor {
            name: "unknown",
            kind: "Unknown",
            root_prim: "/Root",
            uid_property: "uid",
        };

        let work_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FileCatalog::in_memory());
        let compiler = AssetCompiler::new(
            &UNKNOWN,
            catalog.clone(),
            Arc::new(UsdaLoader),
            Arc::new(physics::codecs().create()),
        );
        let request = CompileRequest::new(work_dir.path(), "project", "stone.usda", 0);

        let err = compiler
            .compile_document(&stage_with_uid(""), &request)
            .unwrap_err();
        assert_eq!(err.stage, CompileStage::ComposingOutput);
        assert!(matches!(
            err.error,
            CompilerError::Write(WriteError::CodecNotFound(_))
        ));
        assert!(err.is_retryable());
        assert!(catalog.is_empty());
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    // loaded, but refuses every update
    struct ReadOnlyCatalog;

    impl AssetCatalog for ReadOnlyCatalog {
        fn is_loaded(&self) -> bool {
            true
        }

        fn find_if(&self, _source_path: &str) -> lgn_asset_catalog::Result<Uid> {
            Err(lgn_asset_catalog::Error::NotFound)
        }

        fn find(&self, _uid: Uid) -> Option<AssetMetaInfo> {
            None
        }

        fn add_or_replace(&self, meta: AssetMetaInfo) -> lgn_asset_catalog::Result<()> {
            Err(lgn_asset_catalog::Error::Io(
                meta.source_path.into(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }

        fn len(&self) -> usize {
            0
        }

        fn entries(&self) -> Vec<AssetMetaInfo> {
            Vec::new()
        }
    }

    #[test]
    fn catalog_failure_removes_new_record() {
        let work_dir = tempfile::tempdir().unwrap();
        let compiler = physics::asset_compiler(Arc::new(ReadOnlyCatalog), Arc::new(UsdaLoader));
        let request = CompileRequest::new(work_dir.path(), "project", "stone.usda", 2);

        let err = compiler
            .compile_document(&stage_with_uid(UID), &request)
            .unwrap_err();
        assert_eq!(err.stage, CompileStage::Updating);
        assert!(matches!(err.error, CompilerError::Catalog(_)));
        assert!(!work_dir
            .path()
            .join(format!("2/{}.nphys", UID))
            .exists());
    }

    #[test]
    fn catalog_failure_keeps_replaced_record() {
        let work_dir = tempfile::tempdir().unwrap();
        let target = work_dir.path().join(format!("2/{}.nphys", UID));
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "previous").unwrap();

        let compiler = physics::asset_compiler(Arc::new(ReadOnlyCatalog), Arc::new(UsdaLoader));
        let request = CompileRequest::new(work_dir.path(), "project", "stone.usda", 2);

        let err = compiler
            .compile_document(&stage_with_uid(UID), &request)
            .unwrap_err();
        assert_eq!(err.stage, CompileStage::Updating);
        assert!(target.exists());
    }

    #[test]
    fn catalogued_uid_wins() {
        let work_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FileCatalog::in_memory());
        let known = Uid::generate();
        catalog
            .add_or_replace(AssetMetaInfo::new(known, "stone.usda", "PhysicsMaterial"))
            .unwrap();
        let compiler = physics::asset_compiler(catalog.clone(), Arc::new(UsdaLoader));
        let request = CompileRequest::new(work_dir.path(), "project", "stone.usda", 0);

        let meta = compiler
            .compile_document(&stage_with_uid(UID), &request)
            .unwrap();
        assert_eq!(meta.uid, known);
        assert_eq!(catalog.len(), 1);
    }
}
