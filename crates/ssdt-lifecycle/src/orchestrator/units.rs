//! Work units: one checkpoint of a run each.
//!
//! [`next_unit`] picks the unit for the model's current state. A unit either
//! advances the state, finishes the run through [`StateModel::succeed`], or
//! returns an error that stops the run.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::state::{PipelineState, ProgressReporter, RunKind, StateModel};
use crate::core::{BuildService, FileSystem, PathCollection};
use crate::dac::DacAccess;
use crate::error::{LifecycleError, Result};
use crate::script::{ModifierOutcome, ModifierPipeline, ScriptModificationModel};
use crate::version::Version;

const DACPAC_EXTENSION: &str = "dacpac";

/// Collaborators available to the units of a run.
pub struct UnitContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub build: &'a dyn BuildService,
    pub dac: &'a DacAccess,
    pub modifiers: &'a ModifierPipeline,
    pub cancel: &'a CancellationToken,
    pub progress: Option<&'a ProgressReporter>,
}

impl UnitContext<'_> {
    fn report(&self, message: &str) {
        if let Some(progress) = self.progress {
            progress(message);
        }
    }
}

/// The steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkUnit {
    LoadSqlProjectProperties,
    FormatTargetVersion,
    ValidateTargetVersion,
    LoadPaths,
    VerifyPaths,
    BuildProject,
    CleanNewArtifactsDirectory,
    CopyBuildResult,
    CreateDeploymentFiles,
    ModifyDeploymentScript,
    DeleteRefactorLog,
    DeleteLatestArtifacts,
}

/// Unit to run for the model's current state; `None` once finished.
pub fn next_unit(model: &StateModel) -> Option<WorkUnit> {
    if model.is_finished() {
        return None;
    }
    let scaffold = matches!(model.kind, RunKind::Scaffold { .. });

    let unit = match model.state {
        PipelineState::Initialized => WorkUnit::LoadSqlProjectProperties,
        PipelineState::ProjectPropertiesLoaded => WorkUnit::FormatTargetVersion,
        PipelineState::TargetVersionFormatted => WorkUnit::ValidateTargetVersion,
        PipelineState::TargetVersionValidated => WorkUnit::LoadPaths,
        PipelineState::PathsLoaded => WorkUnit::VerifyPaths,
        PipelineState::PathsVerified => WorkUnit::BuildProject,
        PipelineState::BuildAttempted => WorkUnit::CleanNewArtifactsDirectory,
        PipelineState::ArtifactsDirectoryCleaned => WorkUnit::CopyBuildResult,
        PipelineState::BuildOutputCopied if !scaffold => WorkUnit::CreateDeploymentFiles,
        PipelineState::DeploymentFilesCreated if !scaffold => WorkUnit::ModifyDeploymentScript,
        PipelineState::DeploymentScriptModified if !scaffold => WorkUnit::DeleteRefactorLog,
        PipelineState::RefactorLogDeleted if !scaffold => WorkUnit::DeleteLatestArtifacts,
        _ => return None,
    };
    Some(unit)
}

impl WorkUnit {
    pub fn name(self) -> &'static str {
        match self {
            WorkUnit::LoadSqlProjectProperties => "load project properties",
            WorkUnit::FormatTargetVersion => "format target version",
            WorkUnit::ValidateTargetVersion => "validate target version",
            WorkUnit::LoadPaths => "load paths",
            WorkUnit::VerifyPaths => "verify paths",
            WorkUnit::BuildProject => "build project",
            WorkUnit::CleanNewArtifactsDirectory => "clean artifacts directory",
            WorkUnit::CopyBuildResult => "copy build result",
            WorkUnit::CreateDeploymentFiles => "create deployment files",
            WorkUnit::ModifyDeploymentScript => "modify deployment script",
            WorkUnit::DeleteRefactorLog => "delete refactor log",
            WorkUnit::DeleteLatestArtifacts => "delete latest artifacts",
        }
    }

    /// Perform the unit's work on `model`.
    pub async fn run(self, model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
        debug!("Running work unit: {}", self.name());
        match self {
            WorkUnit::LoadSqlProjectProperties => load_project_properties(model, ctx).await,
            WorkUnit::FormatTargetVersion => format_target_version(model),
            WorkUnit::ValidateTargetVersion => validate_target_version(model),
            WorkUnit::LoadPaths => load_paths(model),
            WorkUnit::VerifyPaths => verify_paths(model, ctx).await,
            WorkUnit::BuildProject => build_project(model, ctx).await,
            WorkUnit::CleanNewArtifactsDirectory => clean_new_artifacts_directory(model, ctx).await,
            WorkUnit::CopyBuildResult => copy_build_result(model, ctx).await,
            WorkUnit::CreateDeploymentFiles => create_deployment_files(model, ctx).await,
            WorkUnit::ModifyDeploymentScript => modify_deployment_script(model, ctx).await,
            WorkUnit::DeleteRefactorLog => delete_refactor_log(model, ctx).await,
            WorkUnit::DeleteLatestArtifacts => delete_latest_artifacts(model, ctx).await,
        }
    }
}

fn paths(model: &StateModel) -> Result<&PathCollection> {
    model
        .paths
        .as_ref()
        .ok_or_else(|| LifecycleError::config("Paths have not been loaded"))
}

fn dac_version(model: &StateModel) -> Result<Version> {
    model
        .project
        .properties
        .dac_version
        .ok_or_else(|| LifecycleError::config("Project properties have not been loaded"))
}

/// True for script runs that produce a real version (not `latest`).
fn is_versioned_script_run(model: &StateModel) -> bool {
    matches!(
        model.kind,
        RunKind::CreateScript {
            create_latest: false,
            ..
        }
    )
}

async fn load_project_properties(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    ctx.report("Loading project properties ...");
    let xml = ctx.fs.read_file(&model.project.full_path).await?;
    model.project.load_properties(&xml)?;
    info!(
        "Loaded properties of {}: target {}, DacVersion {}",
        model.project.name,
        model.project.target_name()?,
        dac_version(model)?
    );
    model.advance(PipelineState::ProjectPropertiesLoaded);
    Ok(())
}

fn format_target_version(model: &mut StateModel) -> Result<()> {
    let pattern = &model.configuration.version_pattern;
    let formatted = match &model.kind {
        RunKind::Scaffold { target_version } => pattern.format(target_version),
        RunKind::CreateScript {
            create_latest: true,
            ..
        } => crate::core::LATEST_DIRECTORY_NAME.to_string(),
        RunKind::CreateScript { .. } => pattern.format(&dac_version(model)?),
    };
    debug!("Formatted target version: {}", formatted);
    model.formatted_target_version = Some(formatted);
    model.advance(PipelineState::TargetVersionFormatted);
    Ok(())
}

fn validate_target_version(model: &mut StateModel) -> Result<()> {
    match &model.kind {
        RunKind::Scaffold { target_version } => {
            if *target_version == Version::default() {
                return Err(LifecycleError::config(
                    "The version to scaffold must have at least one non-zero component",
                ));
            }
        }
        RunKind::CreateScript {
            previous_version,
            create_latest: false,
        } => {
            let configured = dac_version(model)?;
            if configured <= *previous_version {
                return Err(LifecycleError::config(format!(
                    "The configured DacVersion {} must be greater than the previous version {}",
                    configured, previous_version
                )));
            }
        }
        RunKind::CreateScript { .. } => {}
    }
    model.advance(PipelineState::TargetVersionValidated);
    Ok(())
}

fn load_paths(model: &mut StateModel) -> Result<()> {
    let target = model
        .formatted_target_version
        .as_deref()
        .ok_or_else(|| LifecycleError::config("Target version has not been formatted"))?;

    let paths = match &model.kind {
        RunKind::Scaffold { .. } => {
            PathCollection::for_scaffolding(&model.project, &model.configuration, target)?
        }
        RunKind::CreateScript {
            previous_version, ..
        } => {
            let previous = model.configuration.version_pattern.format(previous_version);
            PathCollection::for_script_creation(&model.project, &model.configuration, &previous, target)?
        }
    };
    debug!(
        "New artifacts directory: {}",
        paths.directories.new_artifacts_directory.display()
    );
    model.paths = Some(paths);
    model.advance(PipelineState::PathsLoaded);
    Ok(())
}

/// A tool name without separators is resolved from PATH at launch time.
fn is_explicit_path(tool: &str) -> bool {
    tool.contains(['/', '\\'])
}

async fn verify_paths(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let paths = paths(model)?;
    let mut missing = Vec::new();

    if !ctx.fs.exists(&model.project.full_path).await {
        missing.push(format!("project file {}", model.project.full_path.display()));
    }
    if let RunKind::CreateScript { .. } = model.kind {
        if let Some(previous) = &paths.deploy_sources.previous_dacpac_path {
            if !ctx.fs.exists(previous).await {
                missing.push(format!("previous dacpac {}", previous.display()));
            }
        }
        let profile = &paths.deploy_sources.publish_profile_path;
        if !ctx.fs.exists(profile).await {
            missing.push(format!("publish profile {}", profile.display()));
        }
        let tool = &model.configuration.sql_package_path;
        if is_explicit_path(tool) && !ctx.fs.exists(Path::new(tool)).await {
            missing.push(format!("SqlPackage executable {}", tool));
        }
    }

    if !missing.is_empty() {
        for entry in &missing {
            error!("Missing {}", entry);
        }
        return Err(LifecycleError::environment(format!(
            "Missing {}",
            missing.join(", ")
        )));
    }
    model.advance(PipelineState::PathsVerified);
    Ok(())
}

async fn build_project(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let wanted = match model.kind {
        RunKind::Scaffold { .. } => true,
        RunKind::CreateScript { .. } => model.configuration.build_before_script_creation,
    };
    if wanted {
        ctx.report("Building project ...");
        // success is judged by the build output in CopyBuildResult
        match ctx.build.build(&model.project, ctx.cancel).await {
            Ok(()) => {}
            Err(LifecycleError::Cancelled) => return Err(LifecycleError::Cancelled),
            Err(e) => warn!("{}", e),
        }
    } else {
        debug!("Skipping build");
    }
    model.advance(PipelineState::BuildAttempted);
    Ok(())
}

async fn clean_new_artifacts_directory(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let directory = &paths(model)?.directories.new_artifacts_directory;
    if ctx.fs.exists(directory).await {
        ctx.report("Cleaning artifacts directory ...");
        let failures = ctx.fs.delete_directory(directory).await;
        if !failures.is_empty() {
            for failure in &failures {
                error!("{}", failure);
            }
            return Err(LifecycleError::environment(format!(
                "Could not clean {}",
                directory.display()
            )));
        }
    }
    model.advance(PipelineState::ArtifactsDirectoryCleaned);
    Ok(())
}

async fn copy_build_result(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let paths = paths(model)?;
    let build_output = &paths.build_output_dacpac_path;
    let binary_directory = build_output
        .parent()
        .ok_or_else(|| LifecycleError::config("Build output has no directory"))?;

    ctx.report("Copying build result ...");
    let dacpacs = if ctx.fs.exists(binary_directory).await {
        ctx.fs.list_files(binary_directory, DACPAC_EXTENSION).await?
    } else {
        Vec::new()
    };
    if !dacpacs.iter().any(|p| p == build_output) {
        return Err(LifecycleError::environment(format!(
            "Build output {} not found",
            build_output.display()
        )));
    }

    let target = &paths.directories.new_artifacts_directory;
    let failures = ctx.fs.copy_files(&dacpacs, target).await;
    if !failures.is_empty() {
        for failure in &failures {
            error!("Failed to copy {}: {}", failure.source.display(), failure.message);
        }
        return Err(LifecycleError::environment(format!(
            "Could not copy the build result to {}",
            target.display()
        )));
    }
    info!("Copied {} dacpac(s) to {}", dacpacs.len(), target.display());

    model.advance(PipelineState::BuildOutputCopied);
    if matches!(model.kind, RunKind::Scaffold { .. }) {
        model.succeed();
    }
    Ok(())
}

async fn create_deployment_files(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let paths = paths(model)?;
    let sources = &paths.deploy_sources;
    let targets = &paths.deploy_targets;
    let previous = sources
        .previous_dacpac_path
        .as_deref()
        .ok_or_else(|| LifecycleError::config("No previous dacpac to compare with"))?;

    ctx.report("Creating deployment files ...");
    let files = match ctx
        .dac
        .create_deploy_files(
            previous,
            &sources.new_dacpac_path,
            &sources.publish_profile_path,
            targets.deploy_script_path.is_some(),
            targets.deploy_report_path.is_some(),
            ctx.cancel,
        )
        .await
    {
        Ok(files) => files,
        Err(LifecycleError::Engine(messages)) => {
            for message in &messages {
                error!("{}", message);
            }
            return Err(LifecycleError::Engine(messages));
        }
        Err(e) => return Err(e),
    };

    if let (Some(path), Some(script)) = (&targets.deploy_script_path, &files.deploy_script) {
        ctx.fs.write_file(path, script).await?;
        info!("Deploy script written to {}", path.display());
    }
    if let (Some(path), Some(report)) = (&targets.deploy_report_path, &files.deploy_report) {
        ctx.fs.write_file(path, report).await?;
        info!("Deploy report written to {}", path.display());
    }
    if let Some(summary) = &files.publish_profile_summary {
        for line in summary.lines() {
            debug!("Publish profile: {}", line);
        }
    }
    if files.pre_deployment_script.is_some() || files.post_deployment_script.is_some() {
        debug!("The new dacpac carries pre/post deployment scripts");
    }

    model.advance(PipelineState::DeploymentFilesCreated);
    Ok(())
}

async fn modify_deployment_script(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    let RunKind::CreateScript {
        previous_version,
        create_latest,
    } = model.kind.clone()
    else {
        return Err(LifecycleError::config("Only script runs modify a deployment script"));
    };
    let paths = paths(model)?.clone();
    let Some(script_path) = paths.deploy_targets.deploy_script_path.clone() else {
        model.advance(PipelineState::DeploymentScriptModified);
        return Ok(());
    };

    ctx.report("Modifying deployment script ...");
    let script = ctx.fs.read_file(&script_path).await?;
    let modification = ScriptModificationModel {
        current_script: script,
        project: model.project.clone(),
        configuration: model.configuration.clone(),
        paths,
        previous_version,
        create_latest,
    };

    match ctx.modifiers.apply(modification, ctx.cancel).await? {
        ModifierOutcome::Modified(script) => ctx.fs.write_file(&script_path, &script).await?,
        ModifierOutcome::Cancelled => return Err(LifecycleError::Cancelled),
    }

    model.advance(PipelineState::DeploymentScriptModified);
    Ok(())
}

async fn delete_refactor_log(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    if is_versioned_script_run(model)
        && model
            .configuration
            .delete_refactor_log_after_versioned_script_generation
    {
        let refactor_log = &paths(model)?.refactor_log_path;
        if ctx.fs.exists(refactor_log).await {
            ctx.fs.delete_file(refactor_log).await?;
            info!("Deleted refactor log {}", refactor_log.display());
        }
    }
    model.advance(PipelineState::RefactorLogDeleted);
    Ok(())
}

async fn delete_latest_artifacts(model: &mut StateModel, ctx: &UnitContext<'_>) -> Result<()> {
    if is_versioned_script_run(model)
        && model
            .configuration
            .delete_latest_after_versioned_script_generation
    {
        let latest = &paths(model)?.directories.latest_artifacts_directory;
        if ctx.fs.exists(latest).await {
            for failure in ctx.fs.delete_directory(latest).await {
                warn!("{}", failure);
            }
            info!("Deleted latest artifacts {}", latest.display());
        }
    }
    model.advance(PipelineState::SupersededArtifactsDeleted);
    model.succeed();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::core::Project;

    fn model(kind: RunKind) -> StateModel {
        StateModel::new(kind, Project::from_path("/work/Db/Db.sqlproj"), Configuration::default())
    }

    #[test]
    fn test_scaffold_stops_after_copy() {
        let mut model = model(RunKind::Scaffold {
            target_version: Version::new(1, 0, 0, 0),
        });
        model.state = PipelineState::ArtifactsDirectoryCleaned;
        assert_eq!(next_unit(&model), Some(WorkUnit::CopyBuildResult));
        model.state = PipelineState::BuildOutputCopied;
        assert_eq!(next_unit(&model), None);
    }

    #[test]
    fn test_create_script_runs_all_units() {
        let mut model = model(RunKind::CreateScript {
            previous_version: Version::new(1, 0, 0, 0),
            create_latest: false,
        });
        model.state = PipelineState::BuildOutputCopied;
        assert_eq!(next_unit(&model), Some(WorkUnit::CreateDeploymentFiles));
        model.state = PipelineState::RefactorLogDeleted;
        assert_eq!(next_unit(&model), Some(WorkUnit::DeleteLatestArtifacts));
        model.state = PipelineState::SupersededArtifactsDeleted;
        assert_eq!(next_unit(&model), None);
    }

    #[test]
    fn test_finished_model_has_no_unit() {
        let mut model = model(RunKind::Scaffold {
            target_version: Version::new(1, 0, 0, 0),
        });
        model.fail();
        assert_eq!(next_unit(&model), None);
    }

    #[test]
    fn test_scaffold_version_must_not_be_zero() {
        let mut model = model(RunKind::Scaffold {
            target_version: Version::default(),
        });
        assert!(validate_target_version(&mut model).is_err());
        assert_eq!(model.state, PipelineState::Initialized);
    }

    #[test]
    fn test_configured_version_must_be_greater() {
        let mut model = model(RunKind::CreateScript {
            previous_version: Version::new(1, 1, 0, 0),
            create_latest: false,
        });
        model
            .project
            .load_properties("<Project><PropertyGroup><DacVersion>1.1.0.0</DacVersion></PropertyGroup></Project>")
            .unwrap();
        assert!(validate_target_version(&mut model).is_err());

        if let RunKind::CreateScript { create_latest, .. } = &mut model.kind {
            *create_latest = true;
        }
        validate_target_version(&mut model).unwrap();
        assert_eq!(model.state, PipelineState::TargetVersionValidated);
    }

    #[test]
    fn test_explicit_tool_path() {
        assert!(!is_explicit_path("SqlPackage"));
        assert!(is_explicit_path("C:\\Tools\\SqlPackage.exe"));
        assert!(is_explicit_path("/opt/sqlpackage/sqlpackage"));
    }
}
