//! Sequential application of the enabled modifiers.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::modifiers::{ModifierOutcome, ModifierRegistry};
use crate::config::Configuration;
use crate::core::{PathCollection, Project, LATEST_DIRECTORY_NAME};
use crate::error::{LifecycleError, Result};
use crate::version::Version;

/// Working state of one modification run.
#[derive(Debug, Clone)]
pub struct ScriptModificationModel {
    /// Script as produced by the previous modifier.
    pub current_script: String,
    pub project: Project,
    pub configuration: Configuration,
    pub paths: PathCollection,
    pub previous_version: Version,
    pub create_latest: bool,
}

impl ScriptModificationModel {
    pub fn formatted_previous_version(&self) -> String {
        self.configuration.version_pattern.format(&self.previous_version)
    }

    /// `latest`, or the project's configured version.
    pub fn formatted_next_version(&self) -> Result<String> {
        if self.create_latest {
            return Ok(LATEST_DIRECTORY_NAME.to_string());
        }
        let version = self
            .project
            .properties
            .dac_version
            .ok_or_else(|| LifecycleError::config("Project properties have not been loaded"))?;
        Ok(self.configuration.version_pattern.format(&version))
    }
}

/// Applies the modifiers of a registry in priority order.
#[derive(Clone)]
pub struct ModifierPipeline {
    registry: ModifierRegistry,
}

impl ModifierPipeline {
    pub fn new(registry: ModifierRegistry) -> Self {
        Self { registry }
    }

    /// Run every enabled modifier over `model.current_script`.
    ///
    /// Returns the final script, or [`ModifierOutcome::Cancelled`] as soon as
    /// a modifier reports cancellation.
    pub async fn apply(
        &self,
        mut model: ScriptModificationModel,
        cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        let modifiers = self.registry.select(&model.configuration);
        debug!("Applying {} script modifier(s)", modifiers.len());

        for modifier in modifiers {
            let script = std::mem::take(&mut model.current_script);
            match modifier.modify(script, &model, cancel).await? {
                ModifierOutcome::Modified(script) => model.current_script = script,
                ModifierOutcome::Cancelled => {
                    info!("Script modification cancelled at {:?}", modifier.priority());
                    return Ok(ModifierOutcome::Cancelled);
                }
            }
        }

        Ok(ModifierOutcome::Modified(model.current_script))
    }
}
