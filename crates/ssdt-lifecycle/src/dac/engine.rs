//! Schema compare engine seam.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::DefaultConstraint;
use crate::error::LifecycleError;

/// Inputs of a schema compare.
#[derive(Debug, Clone, Copy)]
pub struct CompareRequest<'a> {
    pub previous_dacpac_path: &'a Path,
    pub new_dacpac_path: &'a Path,
    pub publish_profile_path: &'a Path,
    pub create_script: bool,
    pub create_report: bool,
}

/// Raw engine output, before any post-processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub deploy_script: Option<String>,
    pub deploy_report: Option<String>,
    pub pre_deployment_script: Option<String>,
    pub post_deployment_script: Option<String>,
    pub publish_profile_summary: Option<String>,
}

/// Failure raised by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structured failure with the engine's own messages.
    #[error("{message}")]
    Failed {
        message: String,
        messages: Vec<String>,
    },

    #[error(transparent)]
    Other(#[from] LifecycleError),
}

impl EngineError {
    pub fn failed(message: impl Into<String>, messages: Vec<String>) -> Self {
        EngineError::Failed {
            message: message.into(),
            messages,
        }
    }
}

/// Compares two dacpacs and reads dacpac metadata.
#[async_trait]
pub trait SchemaCompareEngine: Send + Sync {
    /// Generate the deploy script and/or report upgrading `previous` to `new`.
    async fn compare(
        &self,
        request: &CompareRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<EngineOutput, EngineError>;

    /// Default constraints defined in a dacpac.
    async fn default_constraints(&self, dacpac_path: &Path) -> Result<Vec<DefaultConstraint>, EngineError>;
}
