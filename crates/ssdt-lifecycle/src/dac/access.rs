//! Schema diff access: deploy files and default constraints from dacpacs.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::engine::{CompareRequest, EngineError, SchemaCompareEngine};
use super::report::format_report;
use crate::core::DefaultConstraint;
use crate::error::{LifecycleError, Result};

/// Files produced by comparing two dacpacs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployFiles {
    pub deploy_script: Option<String>,
    /// Formatted deploy report XML.
    pub deploy_report: Option<String>,
    pub pre_deployment_script: Option<String>,
    pub post_deployment_script: Option<String>,
    pub publish_profile_summary: Option<String>,
}

/// Front for the schema compare engine.
///
/// Engine failures surface as [`LifecycleError::Engine`] holding the
/// top-level message followed by the engine's own messages.
#[derive(Clone)]
pub struct DacAccess {
    engine: Arc<dyn SchemaCompareEngine>,
}

impl DacAccess {
    pub fn new(engine: Arc<dyn SchemaCompareEngine>) -> Self {
        Self { engine }
    }

    /// Compare `previous` with `new` and produce the requested files.
    pub async fn create_deploy_files(
        &self,
        previous_dacpac_path: &Path,
        new_dacpac_path: &Path,
        publish_profile_path: &Path,
        create_script: bool,
        create_report: bool,
        cancel: &CancellationToken,
    ) -> Result<DeployFiles> {
        if !create_script && !create_report {
            return Err(LifecycleError::config(
                "Either a deploy script or a deploy report must be requested",
            ));
        }

        let request = CompareRequest {
            previous_dacpac_path,
            new_dacpac_path,
            publish_profile_path,
            create_script,
            create_report,
        };
        debug!(
            "Comparing {} with {}",
            previous_dacpac_path.display(),
            new_dacpac_path.display()
        );
        let output = self
            .engine
            .compare(&request, cancel)
            .await
            .map_err(engine_error)?;

        let deploy_report = output
            .deploy_report
            .as_deref()
            .map(format_report)
            .transpose()?;

        Ok(DeployFiles {
            deploy_script: output.deploy_script,
            deploy_report,
            pre_deployment_script: output.pre_deployment_script,
            post_deployment_script: output.post_deployment_script,
            publish_profile_summary: output.publish_profile_summary,
        })
    }

    /// Default constraints defined in the dacpac at `dacpac_path`.
    pub async fn get_default_constraints(&self, dacpac_path: &Path) -> Result<Vec<DefaultConstraint>> {
        self.engine
            .default_constraints(dacpac_path)
            .await
            .map_err(engine_error)
    }
}

fn engine_error(error: EngineError) -> LifecycleError {
    match error {
        EngineError::Failed { message, messages } => {
            LifecycleError::Engine(std::iter::once(message).chain(messages).collect())
        }
        EngineError::Other(LifecycleError::Cancelled) => LifecycleError::Cancelled,
        EngineError::Other(other) => LifecycleError::Engine(vec![other.to_string()]),
    }
}
