//! Run state tracked by the orchestrator.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::core::{PathCollection, Project};
use crate::version::Version;

/// Checkpoints of a run. Later checkpoints have larger ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum PipelineState {
    Initialized = 0,
    ProjectPropertiesLoaded = 100,
    TargetVersionFormatted = 200,
    TargetVersionValidated = 300,
    PathsLoaded = 400,
    PathsVerified = 500,
    BuildAttempted = 600,
    ArtifactsDirectoryCleaned = 700,
    BuildOutputCopied = 800,
    DeploymentFilesCreated = 900,
    DeploymentScriptModified = 1000,
    RefactorLogDeleted = 1100,
    SupersededArtifactsDeleted = 1200,
}

impl PipelineState {
    pub fn ordinal(self) -> u16 {
        self as u16
    }
}

/// What a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    /// Copy the build output as the first version.
    Scaffold { target_version: Version },
    /// Create a deploy script from `previous_version` to the configured
    /// version, or to `latest`.
    CreateScript {
        previous_version: Version,
        create_latest: bool,
    },
}

impl RunKind {
    pub fn name(&self) -> &'static str {
        match self {
            RunKind::Scaffold { .. } => "scaffold",
            RunKind::CreateScript { .. } => "create-script",
        }
    }

    pub fn is_create_latest(&self) -> bool {
        matches!(
            self,
            RunKind::CreateScript {
                create_latest: true,
                ..
            }
        )
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback receiving short work-in-progress texts.
pub type ProgressReporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Mutable state of a single run.
#[derive(Debug, Clone)]
pub struct StateModel {
    /// Unique run identifier.
    pub run_id: String,
    pub kind: RunKind,
    pub project: Project,
    /// Snapshot taken when the run started.
    pub configuration: Configuration,
    pub state: PipelineState,
    pub formatted_target_version: Option<String>,
    pub paths: Option<PathCollection>,
    /// `None` while running or after cancellation; `Some(false)` on failure.
    pub result: Option<bool>,
    pub started_at: DateTime<Utc>,
}

impl StateModel {
    pub fn new(kind: RunKind, project: Project, configuration: Configuration) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            kind,
            project,
            configuration,
            state: PipelineState::Initialized,
            formatted_target_version: None,
            paths: None,
            result: None,
            started_at: Utc::now(),
        }
    }

    /// Move forward to `state`; never goes back.
    pub fn advance(&mut self, state: PipelineState) {
        if state > self.state {
            self.state = state;
        }
    }

    /// Stop the run as failed.
    pub fn fail(&mut self) {
        self.result = Some(false);
    }

    /// Stop the run as succeeded.
    pub fn succeed(&mut self) {
        self.result = Some(true);
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PipelineState; 13] = [
        PipelineState::Initialized,
        PipelineState::ProjectPropertiesLoaded,
        PipelineState::TargetVersionFormatted,
        PipelineState::TargetVersionValidated,
        PipelineState::PathsLoaded,
        PipelineState::PathsVerified,
        PipelineState::BuildAttempted,
        PipelineState::ArtifactsDirectoryCleaned,
        PipelineState::BuildOutputCopied,
        PipelineState::DeploymentFilesCreated,
        PipelineState::DeploymentScriptModified,
        PipelineState::RefactorLogDeleted,
        PipelineState::SupersededArtifactsDeleted,
    ];

    #[test]
    fn test_ordinals_strictly_increase() {
        for pair in ALL.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(PipelineState::SupersededArtifactsDeleted.ordinal(), 1200);
    }

    #[test]
    fn test_advance_never_goes_back() {
        let mut model = StateModel::new(
            RunKind::Scaffold {
                target_version: Version::new(1, 0, 0, 0),
            },
            Project::from_path("/work/Db/Db.sqlproj"),
            Configuration::default(),
        );
        model.advance(PipelineState::PathsLoaded);
        model.advance(PipelineState::ProjectPropertiesLoaded);
        assert_eq!(model.state, PipelineState::PathsLoaded);
        assert!(!model.is_finished());
    }
}
