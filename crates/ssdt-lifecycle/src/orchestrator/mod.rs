//! Deployment orchestrator - runs scaffold and script creation.
//!
//! A run is a sequence of [`WorkUnit`]s chosen by [`next_unit`] from the
//! run's [`StateModel`]. Cancellation is checked before and after every unit.
//! A cancelled run ends with `result == None`; any unit error ends it with
//! `Some(false)`.

mod state;
mod units;

pub use state::{PipelineState, ProgressReporter, RunKind, StateModel};
pub use units::{next_unit, UnitContext, WorkUnit};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Configuration;
use crate::core::{BuildService, FileSystem, Project, LATEST_DIRECTORY_NAME};
use crate::dac::{DacAccess, SchemaCompareEngine};
use crate::error::{LifecycleError, Result};
use crate::script::{ModifierPipeline, ModifierRegistry};
use crate::version::Version;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Result of a scaffold or script creation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: String,

    /// `scaffold` or `create-script`.
    pub kind: String,

    pub status: RunStatus,

    /// `None` if cancelled.
    pub result: Option<bool>,

    /// Last checkpoint reached.
    pub final_state: PipelineState,

    /// Formatted target version (or `latest`).
    pub target_version: Option<String>,

    /// Directory the run wrote its artifacts to.
    pub artifacts_directory: Option<PathBuf>,

    pub deploy_script_path: Option<PathBuf>,

    pub deploy_report_path: Option<PathBuf>,

    /// Error that stopped the run.
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub duration_seconds: f64,
}

impl RunSummary {
    fn from_model(model: &StateModel, error: Option<String>) -> Self {
        let completed_at = Utc::now();
        let status = match model.result {
            Some(true) => RunStatus::Succeeded,
            Some(false) => RunStatus::Failed,
            None => RunStatus::Cancelled,
        };
        let paths = model.paths.as_ref();

        Self {
            run_id: model.run_id.clone(),
            kind: model.kind.name().to_string(),
            status,
            result: model.result,
            final_state: model.state,
            target_version: model.formatted_target_version.clone(),
            artifacts_directory: paths.map(|p| p.directories.new_artifacts_directory.clone()),
            deploy_script_path: paths.and_then(|p| p.deploy_targets.deploy_script_path.clone()),
            deploy_report_path: paths.and_then(|p| p.deploy_targets.deploy_report_path.clone()),
            error,
            started_at: model.started_at,
            completed_at,
            duration_seconds: (completed_at - model.started_at).num_milliseconds() as f64 / 1000.0,
        }
    }
}

/// Releases a single-flight flag when dropped.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
    service: &'a DeploymentService,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.service.publish_running();
        debug!("Long-running task finished");
    }
}

/// Runs scaffold and script creation for database projects.
///
/// At most one scaffold and one script creation run at a time per instance.
pub struct DeploymentService {
    fs: Arc<dyn FileSystem>,
    build: Arc<dyn BuildService>,
    dac: DacAccess,
    modifiers: ModifierPipeline,
    progress: Option<ProgressReporter>,
    scaffold_running: AtomicBool,
    script_running: AtomicBool,
    running: watch::Sender<bool>,
}

impl DeploymentService {
    /// Create a service with the standard script modifiers.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        build: Arc<dyn BuildService>,
        engine: Arc<dyn SchemaCompareEngine>,
    ) -> Self {
        let dac = DacAccess::new(engine);
        let modifiers = ModifierPipeline::new(ModifierRegistry::standard(&dac));
        let (running, _) = watch::channel(false);

        Self {
            fs,
            build,
            dac,
            modifiers,
            progress: None,
            scaffold_running: AtomicBool::new(false),
            script_running: AtomicBool::new(false),
            running,
        }
    }

    /// Replace the script modifiers.
    pub fn with_modifiers(mut self, registry: ModifierRegistry) -> Self {
        self.modifiers = ModifierPipeline::new(registry);
        self
    }

    /// Receive work-in-progress texts.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// True while any run is in progress.
    pub fn is_running(&self) -> bool {
        self.scaffold_running.load(Ordering::SeqCst) || self.script_running.load(Ordering::SeqCst)
    }

    /// Subscribe to changes of [`is_running`](Self::is_running).
    pub fn is_running_changed(&self) -> watch::Receiver<bool> {
        self.running.subscribe()
    }

    fn publish_running(&self) {
        let now = self.is_running();
        self.running.send_if_modified(|current| {
            if *current == now {
                false
            } else {
                *current = now;
                true
            }
        });
    }

    fn acquire<'a>(&'a self, flag: &'a AtomicBool, kind: &'static str) -> Result<RunGuard<'a>> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LifecycleError::AlreadyRunning(kind))?;
        debug!("Long-running task started");
        self.publish_running();
        Ok(RunGuard {
            flag,
            service: self,
        })
    }

    /// Copy the build output of `project` as version `target_version`.
    pub async fn scaffold(
        &self,
        project: Project,
        configuration: Configuration,
        target_version: Version,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        configuration.ensure_valid()?;
        let _guard = self.acquire(&self.scaffold_running, "scaffold")?;

        let model = StateModel::new(RunKind::Scaffold { target_version }, project, configuration);
        Ok(self.execute(model, cancel).await)
    }

    /// Create the deploy script from `previous_version` to the project's
    /// configured version, or to `latest`.
    pub async fn create_script(
        &self,
        project: Project,
        configuration: Configuration,
        previous_version: Version,
        create_latest: bool,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        configuration.ensure_valid()?;
        let _guard = self.acquire(&self.script_running, "create-script")?;

        let model = StateModel::new(
            RunKind::CreateScript {
                previous_version,
                create_latest,
            },
            project,
            configuration,
        );
        Ok(self.execute(model, cancel).await)
    }

    /// Versions present in the artifacts directory, newest first.
    pub async fn available_versions(
        &self,
        project: &Project,
        configuration: &Configuration,
    ) -> Result<Vec<Version>> {
        let root = project.directory().join(&configuration.artifacts_path);
        if !self.fs.exists(&root).await {
            return Ok(Vec::new());
        }

        let mut versions: Vec<Version> = self
            .fs
            .list_directories(&root)
            .await?
            .iter()
            .filter_map(|dir| dir.file_name()?.to_str())
            .filter(|name| *name != LATEST_DIRECTORY_NAME)
            .filter_map(|name| name.parse().ok())
            .collect();
        versions.sort_unstable_by(|a, b| b.cmp(a));
        versions.dedup();
        Ok(versions)
    }

    async fn execute(&self, model: StateModel, cancel: &CancellationToken) -> RunSummary {
        let span = info_span!("pipeline", run_id = %model.run_id, kind = model.kind.name());
        self.run_units(model, cancel).instrument(span).await
    }

    async fn run_units(&self, mut model: StateModel, cancel: &CancellationToken) -> RunSummary {
        info!("Starting {} for {}", model.kind, model.project.name);
        let ctx = UnitContext {
            fs: self.fs.as_ref(),
            build: self.build.as_ref(),
            dac: &self.dac,
            modifiers: &self.modifiers,
            cancel,
            progress: self.progress.as_ref(),
        };
        let mut failure = None;

        loop {
            if cancel.is_cancelled() {
                warn!("{} cancelled before {:?}", model.kind, model.state);
                break;
            }
            let Some(unit) = next_unit(&model) else {
                break;
            };

            let before = model.state;
            match unit.run(&mut model, &ctx).await {
                Ok(()) => {}
                Err(LifecycleError::Cancelled) => {
                    warn!("{} cancelled during {}", model.kind, unit.name());
                    break;
                }
                Err(e) => {
                    error!("Failed to {}: {}", unit.name(), e);
                    failure = Some(e.to_string());
                    model.fail();
                    break;
                }
            }

            if model.state == before && !model.is_finished() {
                error!(critical = true, "Work unit {} did not advance the run", unit.name());
                failure = Some(format!("Work unit {} did not advance the run", unit.name()));
                model.fail();
                break;
            }
            if cancel.is_cancelled() && !model.is_finished() {
                warn!("{} cancelled after {}", model.kind, unit.name());
                break;
            }
        }

        let summary = RunSummary::from_model(&model, failure);
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        match summary.status {
            RunStatus::Succeeded => info!("========== {}: {} succeeded ==========", stamp, model.kind),
            RunStatus::Failed => error!("========== {}: {} failed ==========", stamp, model.kind),
            RunStatus::Cancelled => warn!("========== {}: {} cancelled ==========", stamp, model.kind),
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CopyFailure, DefaultConstraint};
    use crate::dac::{CompareRequest, EngineError, EngineOutput};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MemoryFileSystem {
        files: Mutex<BTreeMap<PathBuf, String>>,
    }

    impl MemoryFileSystem {
        fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
            let fs = Self::default();
            {
                let mut map = fs.files.lock().unwrap();
                for (path, content) in files {
                    map.insert(PathBuf::from(path), content.to_string());
                }
            }
            Arc::new(fs)
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }

        fn not_found(path: &Path) -> LifecycleError {
            std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()).into()
        }
    }

    #[async_trait]
    impl FileSystem for MemoryFileSystem {
        async fn read_file(&self, path: &Path) -> Result<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| Self::not_found(path))
        }

        async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        async fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().keys().any(|p| p.starts_with(path))
        }

        async fn list_directories(&self, path: &Path) -> Result<Vec<PathBuf>> {
            let mut dirs: Vec<PathBuf> = self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter_map(|p| {
                    let relative = p.strip_prefix(path).ok()?;
                    let mut components = relative.components();
                    let first = components.next()?;
                    components.next()?;
                    Some(path.join(first))
                })
                .collect();
            dirs.dedup();
            Ok(dirs)
        }

        async fn list_files(&self, path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|p| p.parent() == Some(path))
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
                })
                .cloned()
                .collect())
        }

        async fn copy_files(&self, sources: &[PathBuf], target_directory: &Path) -> Vec<CopyFailure> {
            let mut files = self.files.lock().unwrap();
            let mut failures = Vec::new();
            for source in sources {
                match (files.get(source).cloned(), source.file_name()) {
                    (Some(content), Some(name)) => {
                        files.insert(target_directory.join(name), content);
                    }
                    _ => failures.push(CopyFailure {
                        source: source.clone(),
                        message: "not found".to_string(),
                    }),
                }
            }
            failures
        }

        async fn delete_file(&self, path: &Path) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(path))
        }

        async fn delete_directory(&self, path: &Path) -> Vec<String> {
            self.files.lock().unwrap().retain(|p, _| !p.starts_with(path));
            Vec::new()
        }
    }

    /// Writes the dacpac into the build output directory.
    struct FakeBuild {
        fs: Arc<MemoryFileSystem>,
        builds: AtomicUsize,
        started: Option<Arc<Notify>>,
        release: Option<Arc<Notify>>,
    }

    impl FakeBuild {
        fn new(fs: &Arc<MemoryFileSystem>) -> Self {
            Self {
                fs: fs.clone(),
                builds: AtomicUsize::new(0),
                started: None,
                release: None,
            }
        }
    }

    #[async_trait]
    impl BuildService for FakeBuild {
        async fn build(&self, project: &Project, _cancel: &CancellationToken) -> Result<()> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if let Some(started) = &self.started {
                started.notify_one();
            }
            if let Some(release) = &self.release {
                release.notified().await;
            }
            let output = project
                .properties
                .binary_directory
                .clone()
                .unwrap()
                .join(format!("{}.dacpac", project.target_name()?));
            self.fs.write_file(&output, "new model").await
        }
    }

    struct FakeEngine {
        fail: bool,
    }

    #[async_trait]
    impl SchemaCompareEngine for FakeEngine {
        async fn compare(
            &self,
            request: &CompareRequest<'_>,
            _cancel: &CancellationToken,
        ) -> std::result::Result<EngineOutput, EngineError> {
            if self.fail {
                return Err(EngineError::failed("Deployment plan failed", vec!["SQL72014".to_string()]));
            }
            Ok(EngineOutput {
                deploy_script: request.create_script.then(|| {
                    ":setvar DatabaseName \"Db\"\nGO\nUSE [$(DatabaseName)];\nGO\nPRINT N'Update complete.';\nGO\n".to_string()
                }),
                deploy_report: request
                    .create_report
                    .then(|| "<DeploymentReport><Operations /></DeploymentReport>".to_string()),
                ..Default::default()
            })
        }

        async fn default_constraints(
            &self,
            _dacpac_path: &Path,
        ) -> std::result::Result<Vec<DefaultConstraint>, EngineError> {
            Ok(Vec::new())
        }
    }

    const PROJECT_FILE: &str = "/work/Db/Db.sqlproj";
    const PROJECT_XML: &str =
        "<Project><PropertyGroup><DacVersion>1.1.0.0</DacVersion></PropertyGroup></Project>";

    fn configuration() -> Configuration {
        Configuration {
            publish_profile_path: "Db.publish.xml".to_string(),
            ..Default::default()
        }
    }

    fn workspace() -> Arc<MemoryFileSystem> {
        MemoryFileSystem::with_files(&[
            (PROJECT_FILE, PROJECT_XML),
            ("/work/Db/Db.publish.xml", "<Project />"),
            ("/work/Db/Db.refactorlog", "<Operations />"),
            ("/work/Db/_Deployment/1.0.0.0/Db.dacpac", "old model"),
            ("/work/Db/_Deployment/latest/Db.dacpac", "latest model"),
        ])
    }

    fn service(fs: &Arc<MemoryFileSystem>, build: FakeBuild, fail: bool) -> DeploymentService {
        DeploymentService::new(fs.clone(), Arc::new(build), Arc::new(FakeEngine { fail }))
    }

    fn project() -> Project {
        Project::from_path(PROJECT_FILE)
    }

    #[tokio::test]
    async fn test_scaffold_copies_build_output() {
        let fs = workspace();
        let service = service(&fs, FakeBuild::new(&fs), false);

        let summary = service
            .scaffold(project(), configuration(), Version::new(2, 0, 0, 0), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Succeeded);
        assert_eq!(summary.result, Some(true));
        assert_eq!(summary.final_state, PipelineState::BuildOutputCopied);
        assert_eq!(summary.target_version.as_deref(), Some("2.0.0.0"));
        assert_eq!(fs.get("/work/Db/_Deployment/2.0.0.0/Db.dacpac").as_deref(), Some("new model"));
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_create_script_runs_to_the_end() {
        let fs = workspace();
        let mut config = configuration();
        config.delete_refactor_log_after_versioned_script_generation = true;
        config.delete_latest_after_versioned_script_generation = true;
        config.create_documentation_with_script_creation = true;
        let service = service(&fs, FakeBuild::new(&fs), false);

        let summary = service
            .create_script(project(), config, Version::new(1, 0, 0, 0), false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Succeeded);
        assert_eq!(summary.final_state, PipelineState::SupersededArtifactsDeleted);
        let script = fs
            .get("/work/Db/_Deployment/1.1.0.0/Db_1.0.0.0_1.1.0.0.sql")
            .unwrap();
        assert!(script.contains("PRINT N'Update complete.';"));
        assert!(!script.contains(":setvar"));
        assert!(fs.get("/work/Db/_Deployment/1.1.0.0/Db_1.0.0.0_1.1.0.0.xml").is_some());
        assert!(fs.get("/work/Db/Db.refactorlog").is_none());
        assert!(fs.get("/work/Db/_Deployment/latest/Db.dacpac").is_none());
    }

    #[tokio::test]
    async fn test_create_latest_keeps_refactor_log() {
        let fs = workspace();
        let mut config = configuration();
        config.delete_refactor_log_after_versioned_script_generation = true;
        let service = service(&fs, FakeBuild::new(&fs), false);

        let summary = service
            .create_script(project(), config, Version::new(1, 0, 0, 0), true, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Succeeded);
        assert!(fs.get("/work/Db/_Deployment/latest/Db_1.0.0.0_latest.sql").is_some());
        assert!(fs.get("/work/Db/Db.refactorlog").is_some());
    }

    #[tokio::test]
    async fn test_engine_failure_fails_the_run() {
        let fs = workspace();
        let service = service(&fs, FakeBuild::new(&fs), true);

        let summary = service
            .create_script(project(), configuration(), Version::new(1, 0, 0, 0), false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.result, Some(false));
        assert_eq!(summary.final_state, PipelineState::BuildOutputCopied);
        assert!(summary.error.unwrap().contains("SQL72014"));
        assert!(fs.get("/work/Db/_Deployment/1.1.0.0/Db_1.0.0.0_1.1.0.0.sql").is_none());
    }

    #[tokio::test]
    async fn test_missing_previous_dacpac_stops_at_verification() {
        let fs = workspace();
        let build = FakeBuild::new(&fs);
        let service = service(&fs, build, false);

        let summary = service
            .create_script(project(), configuration(), Version::new(0, 9, 0, 0), false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.final_state, PipelineState::PathsLoaded);
        assert!(summary.error.unwrap().contains("previous dacpac"));
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_rejected_before_running() {
        let fs = workspace();
        let service = service(&fs, FakeBuild::new(&fs), false);
        let mut config = configuration();
        config.comment_out_unnamed_default_constraint_drops = true;
        config.replace_unnamed_default_constraint_drops = true;

        let result = service
            .scaffold(project(), config, Version::new(1, 0, 0, 0), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(LifecycleError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fs = workspace();
        let service = service(&fs, FakeBuild::new(&fs), false);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = service
            .scaffold(project(), configuration(), Version::new(1, 0, 0, 0), &cancel)
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Cancelled);
        assert_eq!(summary.result, None);
        assert_eq!(summary.final_state, PipelineState::Initialized);
    }

    #[tokio::test]
    async fn test_cancelled_during_build() {
        let fs = workspace();
        let cancel = CancellationToken::new();
        let on_progress = cancel.clone();
        let service = service(&fs, FakeBuild::new(&fs), false).with_progress(Arc::new(
            move |message: &str| {
                if message.starts_with("Building") {
                    on_progress.cancel();
                }
            },
        ));

        let summary = service
            .scaffold(project(), configuration(), Version::new(1, 0, 0, 0), &cancel)
            .await
            .unwrap();

        assert_eq!(summary.result, None);
        assert_eq!(summary.final_state, PipelineState::BuildAttempted);
        assert!(fs.get("/work/Db/_Deployment/1.0.0.0/Db.dacpac").as_deref() == Some("old model"));
    }

    #[tokio::test]
    async fn test_second_run_of_same_kind_is_rejected() {
        let fs = workspace();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let mut build = FakeBuild::new(&fs);
        build.started = Some(started.clone());
        build.release = Some(release.clone());
        let service = Arc::new(service(&fs, build, false));
        let mut running = service.is_running_changed();

        let first = tokio::spawn({
            let service = service.clone();
            async move {
                service
                    .scaffold(project(), configuration(), Version::new(2, 0, 0, 0), &CancellationToken::new())
                    .await
            }
        });
        started.notified().await;

        assert!(service.is_running());
        assert!(*running.borrow_and_update());
        let second = service
            .scaffold(project(), configuration(), Version::new(3, 0, 0, 0), &CancellationToken::new())
            .await;
        assert!(matches!(second, Err(LifecycleError::AlreadyRunning("scaffold"))));

        release.notify_one();
        let summary = first.await.unwrap().unwrap();
        assert_eq!(summary.status, RunStatus::Succeeded);
        assert!(!service.is_running());
        running.changed().await.unwrap();
        assert!(!*running.borrow());
    }

    #[tokio::test]
    async fn test_states_increase_monotonically() {
        let fs = workspace();
        let build = FakeBuild::new(&fs);
        let dac = DacAccess::new(Arc::new(FakeEngine { fail: false }));
        let modifiers = ModifierPipeline::new(ModifierRegistry::standard(&dac));
        let cancel = CancellationToken::new();
        let ctx = UnitContext {
            fs: &*fs,
            build: &build,
            dac: &dac,
            modifiers: &modifiers,
            cancel: &cancel,
            progress: None,
        };
        let mut model = StateModel::new(
            RunKind::CreateScript {
                previous_version: Version::new(1, 0, 0, 0),
                create_latest: false,
            },
            project(),
            configuration(),
        );

        let mut states = vec![model.state];
        while let Some(unit) = next_unit(&model) {
            unit.run(&mut model, &ctx).await.unwrap();
            states.push(model.state);
        }

        assert_eq!(states.len(), 13);
        assert!(states.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(model.result, Some(true));
    }

    #[tokio::test]
    async fn test_available_versions_newest_first() {
        let fs = workspace();
        fs.write_file(Path::new("/work/Db/_Deployment/1.10.0.0/Db.dacpac"), "x")
            .await
            .unwrap();
        fs.write_file(Path::new("/work/Db/_Deployment/1.2.0.0/Db.dacpac"), "x")
            .await
            .unwrap();
        let service = service(&fs, FakeBuild::new(&fs), false);

        let versions = service
            .available_versions(&project(), &configuration())
            .await
            .unwrap();
        assert_eq!(
            versions,
            vec![
                Version::new(1, 10, 0, 0),
                Version::new(1, 2, 0, 0),
                Version::new(1, 0, 0, 0),
            ]
        );
    }
}
