//! `dotnet build` based [`BuildService`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{BuildService, Project};
use crate::error::{LifecycleError, Result};
use crate::process::run_tool;

/// Builds SDK-style or legacy database projects through the dotnet CLI.
#[derive(Debug, Clone)]
pub struct DotnetBuildService {
    dotnet_path: String,
    configuration: String,
}

impl Default for DotnetBuildService {
    fn default() -> Self {
        Self {
            dotnet_path: "dotnet".to_string(),
            configuration: "Debug".to_string(),
        }
    }
}

impl DotnetBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific dotnet executable.
    pub fn with_dotnet_path(mut self, path: impl Into<String>) -> Self {
        self.dotnet_path = path.into();
        self
    }

    /// Build configuration passed as `-c` (default: Debug).
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }
}

#[async_trait]
impl BuildService for DotnetBuildService {
    async fn build(&self, project: &Project, cancel: &CancellationToken) -> Result<()> {
        info!("Building project {}", project.name);

        let project_path = project.full_path.to_string_lossy().into_owned();
        let args = [
            "build",
            project_path.as_str(),
            "-c",
            self.configuration.as_str(),
            "--nologo",
        ];
        let output = run_tool(&self.dotnet_path, args, cancel).await?;

        for line in output.lines() {
            debug!("build: {}", line);
        }

        if output.success {
            info!("Build of {} finished", project.name);
            Ok(())
        } else {
            warn!(
                "Build of {} exited with code {:?}",
                project.name, output.exit_code
            );
            Err(LifecycleError::Build(format!(
                "dotnet build exited with code {:?}",
                output.exit_code
            )))
        }
    }
}
