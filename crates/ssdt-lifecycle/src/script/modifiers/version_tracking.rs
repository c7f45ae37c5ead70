//! Deployment tracking in `[dbo].[__DacpacVersion]`.
//!
//! The start of the deployment is recorded right after the database switch
//! (or at the top of the script), the end at its very bottom.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ModifierOutcome, ModifierPriority, ScriptModifier};
use crate::error::{LifecycleError, Result};
use crate::script::batch::{BatchIndex, BATCH_SEPARATOR};
use crate::script::pipeline::ScriptModificationModel;
use crate::version::Version;

/// Statement switching to the target database.
pub(crate) const USE_DATABASE_STATEMENT: &str = "USE [$(DatabaseName)];";

const CREATE_TABLE: &str = "IF OBJECT_ID(N'[dbo].[__DacpacVersion]', N'U') IS NULL
BEGIN
    PRINT N'Creating [dbo].[__DacpacVersion]...';
    CREATE TABLE [dbo].[__DacpacVersion]
    (
        [DacpacName] NVARCHAR(512) NOT NULL,
        [Major] INT NOT NULL,
        [Minor] INT NOT NULL,
        [Build] INT NOT NULL,
        [Revision] INT NOT NULL,
        [DeploymentStart] DATETIME2 NOT NULL,
        [DeploymentEnd] DATETIME2 NULL,
        CONSTRAINT [PK___DacpacVersion] PRIMARY KEY ([DacpacName], [Major], [Minor], [Build], [Revision])
    );
END";

fn start_block(name: &str, version: Version) -> String {
    format!(
        "{CREATE_TABLE}\n{BATCH_SEPARATOR}\n\
         INSERT INTO [dbo].[__DacpacVersion] ([DacpacName], [Major], [Minor], [Build], [Revision], [DeploymentStart])\n\
         VALUES (N'{name}', {}, {}, {}, {}, SYSUTCDATETIME());\n{BATCH_SEPARATOR}\n",
        version.major,
        version.minor,
        version.build,
        version.revision,
    )
}

fn end_block(name: &str, version: Version) -> String {
    format!(
        "UPDATE [dbo].[__DacpacVersion]\n\
         SET [DeploymentEnd] = SYSUTCDATETIME()\n\
         WHERE [DacpacName] = N'{name}' AND [Major] = {} AND [Minor] = {} AND [Build] = {} AND [Revision] = {};\n{BATCH_SEPARATOR}\n",
        version.major,
        version.minor,
        version.build,
        version.revision,
    )
}

/// Byte offset right after the batch switching to the target database.
fn start_position(script: &str) -> Option<usize> {
    let index = BatchIndex::new(script);
    let found = index.find(USE_DATABASE_STATEMENT, 0)?;
    index.closing_separator(&found).map(|separator| separator.end)
}

fn ends_with_separator(script: &str) -> bool {
    script
        .trim_end()
        .rsplit('\n')
        .next()
        .is_some_and(|line| line.trim().eq_ignore_ascii_case(BATCH_SEPARATOR))
}

pub struct TrackDacpacVersionModifier;

#[async_trait]
impl ScriptModifier for TrackDacpacVersionModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::TrackDacpacVersion
    }

    async fn modify(
        &self,
        script: String,
        model: &ScriptModificationModel,
        _cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        let name = model.project.target_name()?.replace('\'', "''");
        let version = model
            .project
            .properties
            .dac_version
            .ok_or_else(|| LifecycleError::config("Project properties have not been loaded"))?;

        let start = start_block(&name, version);
        let end = end_block(&name, version);
        let mut modified = String::with_capacity(script.len() + start.len() + end.len() + 8);

        match start_position(&script) {
            Some(position) => {
                modified.push_str(&script[..position]);
                if !modified.ends_with('\n') {
                    modified.push('\n');
                }
                modified.push_str(&start);
                modified.push_str(&script[position..]);
            }
            None => {
                modified.push_str(&start);
                modified.push_str(&script);
            }
        }

        if !modified.ends_with('\n') {
            modified.push('\n');
        }
        if !ends_with_separator(&modified) {
            modified.push_str(BATCH_SEPARATOR);
            modified.push('\n');
        }
        modified.push_str(&end);

        Ok(ModifierOutcome::Modified(modified))
    }
}
