//! Removal of SqlCmd mode statements so the script runs without SqlCmd.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::version_tracking::USE_DATABASE_STATEMENT;
use super::{ModifierOutcome, ModifierPriority, ScriptModifier};
use crate::error::Result;
use crate::script::batch::BatchIndex;
use crate::script::pipeline::ScriptModificationModel;

const SQLCMD_ENABLED_GUARD: &str = "IF N'$(__IsSqlCmdEnabled)' NOT LIKE N'True'";
const ON_ERROR_EXIT: &str = ":on error exit";
const SETVAR_PREFIX: &str = ":setvar ";

/// Remove every batch containing `statement`, together with the separator
/// line that closes it.
fn remove_batches(script: &str, statement: &str) -> String {
    let index = BatchIndex::new(script);
    let mut output = String::with_capacity(script.len());
    let mut cursor = 0;

    while let Some(found) = index.find(statement, cursor) {
        output.push_str(&script[cursor..found.batch_start.max(cursor)]);
        cursor = index
            .closing_separator(&found)
            .map(|separator| separator.end)
            .unwrap_or(found.batch_end);
    }

    output.push_str(&script[cursor..]);
    output
}

fn is_sqlcmd_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let is_setvar = trimmed
        .get(..SETVAR_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SETVAR_PREFIX));
    is_setvar || trimmed.trim_end().eq_ignore_ascii_case(ON_ERROR_EXIT)
}

/// Strip the SqlCmd variables, the error mode, the SqlCmd guard and the
/// database switch from `script`.
pub fn remove_sqlcmd_statements(script: &str) -> String {
    let script = remove_batches(script, SQLCMD_ENABLED_GUARD);
    let script = remove_batches(&script, USE_DATABASE_STATEMENT);
    script
        .split_inclusive('\n')
        .filter(|line| !is_sqlcmd_line(line))
        .collect()
}

pub struct RemoveSqlCmdStatementsModifier;

#[async_trait]
impl ScriptModifier for RemoveSqlCmdStatementsModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::RemoveSqlCmdStatements
    }

    async fn modify(
        &self,
        script: String,
        _model: &ScriptModificationModel,
        _cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        Ok(ModifierOutcome::Modified(remove_sqlcmd_statements(&script)))
    }
}
