//! Resolved absolute paths for one pipeline run.

use std::path::{Path, PathBuf};

use crate::config::Configuration;
use crate::core::Project;
use crate::error::{LifecycleError, Result};

/// Name of the artifacts directory that holds the unreleased state.
pub const LATEST_DIRECTORY_NAME: &str = "latest";

/// Directories involved in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPaths {
    pub project_directory: PathBuf,
    pub latest_artifacts_directory: PathBuf,
    pub new_artifacts_directory: PathBuf,
}

/// Inputs for the schema compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySourcePaths {
    pub new_dacpac_path: PathBuf,
    pub publish_profile_path: PathBuf,
    pub previous_dacpac_path: Option<PathBuf>,
}

/// Outputs of the schema compare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployTargetPaths {
    pub deploy_script_path: Option<PathBuf>,
    pub deploy_report_path: Option<PathBuf>,
}

/// All paths resolved for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCollection {
    pub directories: DirectoryPaths,
    pub deploy_sources: DeploySourcePaths,
    pub deploy_targets: DeployTargetPaths,
    /// Dacpac produced by the project build.
    pub build_output_dacpac_path: PathBuf,
    /// `<project>.refactorlog` next to the project file.
    pub refactor_log_path: PathBuf,
}

impl PathCollection {
    /// Assemble a collection, enforcing that a compare has somewhere to write.
    pub fn new(
        directories: DirectoryPaths,
        deploy_sources: DeploySourcePaths,
        deploy_targets: DeployTargetPaths,
        build_output_dacpac_path: PathBuf,
        refactor_log_path: PathBuf,
    ) -> Result<Self> {
        if deploy_sources.previous_dacpac_path.is_some()
            && deploy_targets.deploy_script_path.is_none()
            && deploy_targets.deploy_report_path.is_none()
        {
            return Err(LifecycleError::config(
                "A previous dacpac requires a deploy script or deploy report path",
            ));
        }

        Ok(Self {
            directories,
            deploy_sources,
            deploy_targets,
            build_output_dacpac_path,
            refactor_log_path,
        })
    }

    /// Paths for scaffolding a version: only the dacpac is produced.
    pub fn for_scaffolding(
        project: &Project,
        config: &Configuration,
        formatted_target_version: &str,
    ) -> Result<Self> {
        let layout = Layout::new(project, config)?;
        let new_artifacts_directory = layout.artifacts_root.join(formatted_target_version);

        Self::new(
            DirectoryPaths {
                project_directory: layout.project_directory.clone(),
                latest_artifacts_directory: layout.artifacts_root.join(LATEST_DIRECTORY_NAME),
                new_artifacts_directory: new_artifacts_directory.clone(),
            },
            DeploySourcePaths {
                new_dacpac_path: new_artifacts_directory.join(&layout.dacpac_name),
                publish_profile_path: layout.publish_profile_path,
                previous_dacpac_path: None,
            },
            DeployTargetPaths::default(),
            layout.build_output_dacpac_path,
            layout.refactor_log_path,
        )
    }

    /// Paths for creating a deploy script from `previous` to `target`.
    ///
    /// `target` is the formatted configured version, or `latest`.
    pub fn for_script_creation(
        project: &Project,
        config: &Configuration,
        formatted_previous_version: &str,
        formatted_target_version: &str,
    ) -> Result<Self> {
        let layout = Layout::new(project, config)?;
        let target_name = project.target_name()?;
        let new_artifacts_directory = layout.artifacts_root.join(formatted_target_version);
        let previous_dacpac_path = layout
            .artifacts_root
            .join(formatted_previous_version)
            .join(&layout.dacpac_name);

        let base_name = format!(
            "{}_{}_{}",
            target_name, formatted_previous_version, formatted_target_version
        );
        let deploy_script_path = new_artifacts_directory.join(format!("{}.sql", base_name));
        let deploy_report_path = config
            .create_documentation_with_script_creation
            .then(|| new_artifacts_directory.join(format!("{}.xml", base_name)));

        Self::new(
            DirectoryPaths {
                project_directory: layout.project_directory.clone(),
                latest_artifacts_directory: layout.artifacts_root.join(LATEST_DIRECTORY_NAME),
                new_artifacts_directory: new_artifacts_directory.clone(),
            },
            DeploySourcePaths {
                new_dacpac_path: new_artifacts_directory.join(&layout.dacpac_name),
                publish_profile_path: layout.publish_profile_path,
                previous_dacpac_path: Some(previous_dacpac_path),
            },
            DeployTargetPaths {
                deploy_script_path: Some(deploy_script_path),
                deploy_report_path,
            },
            layout.build_output_dacpac_path,
            layout.refactor_log_path,
        )
    }
}

/// Locations shared by both run kinds.
struct Layout {
    project_directory: PathBuf,
    artifacts_root: PathBuf,
    dacpac_name: String,
    publish_profile_path: PathBuf,
    build_output_dacpac_path: PathBuf,
    refactor_log_path: PathBuf,
}

impl Layout {
    fn new(project: &Project, config: &Configuration) -> Result<Self> {
        let project_directory = project.directory().to_path_buf();
        let target_name = project.target_name()?;
        let dacpac_name = format!("{}.dacpac", target_name);
        let binary_directory = project
            .properties
            .binary_directory
            .as_deref()
            .ok_or_else(|| LifecycleError::config("Project properties have not been loaded"))?;

        Ok(Self {
            artifacts_root: resolve(&project_directory, &config.artifacts_path),
            publish_profile_path: resolve(&project_directory, &config.publish_profile_path),
            build_output_dacpac_path: binary_directory.join(&dacpac_name),
            refactor_log_path: project_directory.join(format!("{}.refactorlog", project.name)),
            dacpac_name,
            project_directory,
        })
    }
}

fn resolve(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['\\', '/'])
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(base.to_path_buf(), |acc, part| {
            if part == ".." {
                acc.parent().map(Path::to_path_buf).unwrap_or(acc)
            } else {
                acc.join(part)
            }
        })
}
