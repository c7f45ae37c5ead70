//! [`SchemaCompareEngine`] backed by the SqlPackage command line tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::dacpac::{parse_default_constraints, read_dacpac, DacpacContents};
use super::engine::{CompareRequest, EngineError, EngineOutput, SchemaCompareEngine};
use super::profile::summarize_publish_profile;
use crate::core::DefaultConstraint;
use crate::error::{LifecycleError, Result};
use crate::process::{run_tool, ToolOutput};

/// Runs `SqlPackage /Action:Script` and `/Action:DeployReport`.
#[derive(Debug, Clone)]
pub struct SqlPackageEngine {
    executable: String,
    temp_directory: PathBuf,
}

impl SqlPackageEngine {
    /// `executable` is an absolute path or a name resolved from PATH.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            temp_directory: std::env::temp_dir(),
        }
    }

    /// Directory for intermediate tool output (default: system temp).
    pub fn with_temp_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.temp_directory = directory.into();
        self
    }

    async fn run_action(
        &self,
        action: &str,
        extension: &str,
        request: &CompareRequest<'_>,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, EngineError> {
        let output_path = self
            .temp_directory
            .join(format!("ssdt-lifecycle-{}.{}", Uuid::new_v4(), extension));

        let args = [
            format!("/Action:{}", action),
            format!("/SourceFile:{}", request.new_dacpac_path.display()),
            format!("/TargetFile:{}", request.previous_dacpac_path.display()),
            format!("/Profile:{}", request.publish_profile_path.display()),
            format!("/OutputPath:{}", output_path.display()),
        ];

        info!("Running SqlPackage /Action:{}", action);
        let output = run_tool(&self.executable, &args, cancel).await?;
        for line in output.lines() {
            debug!("sqlpackage: {}", line);
        }

        let result = if output.success {
            tokio::fs::read_to_string(&output_path)
                .await
                .map_err(|e| EngineError::Other(e.into()))
        } else {
            Err(failure(action, &output))
        };

        // the tool may have left a partial file behind on failure
        let _ = tokio::fs::remove_file(&output_path).await;
        result
    }
}

fn failure(action: &str, output: &ToolOutput) -> EngineError {
    let messages = output
        .lines()
        .filter(|line| line.starts_with("*** ") || line.contains("Error"))
        .map(|line| line.trim_start_matches("*** ").to_string())
        .collect();
    EngineError::failed(
        format!(
            "SqlPackage /Action:{} exited with code {}",
            action,
            output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ),
        messages,
    )
}

async fn load_dacpac(path: &Path) -> Result<DacpacContents> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_dacpac(&path))
        .await
        .map_err(|e| LifecycleError::Archive(e.to_string()))?
}

#[async_trait]
impl SchemaCompareEngine for SqlPackageEngine {
    async fn compare(
        &self,
        request: &CompareRequest<'_>,
        cancel: &CancellationToken,
    ) -> std::result::Result<EngineOutput, EngineError> {
        let deploy_script = if request.create_script {
            Some(self.run_action("Script", "sql", request, cancel).await?)
        } else {
            None
        };
        let deploy_report = if request.create_report {
            Some(self.run_action("DeployReport", "xml", request, cancel).await?)
        } else {
            None
        };

        let contents = load_dacpac(request.new_dacpac_path).await?;
        let profile = tokio::fs::read_to_string(request.publish_profile_path)
            .await
            .map_err(LifecycleError::from)?;

        Ok(EngineOutput {
            deploy_script,
            deploy_report,
            pre_deployment_script: contents.pre_deployment_script,
            post_deployment_script: contents.post_deployment_script,
            publish_profile_summary: Some(summarize_publish_profile(&profile)?),
        })
    }

    async fn default_constraints(
        &self,
        dacpac_path: &Path,
    ) -> std::result::Result<Vec<DefaultConstraint>, EngineError> {
        let contents = load_dacpac(dacpac_path).await?;
        Ok(parse_default_constraints(&contents.model)?)
    }
}
