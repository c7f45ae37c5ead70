//! Repair of drop statements for unnamed default constraints.
//!
//! The schema compare emits `ALTER TABLE [s].[t] DROP CONSTRAINT ;` for
//! default constraints that were never named. Each such statement is matched
//! against the unnamed constraints that really disappeared between the two
//! dacpacs and rewritten into a drop that looks the constraint name up in the
//! target database's catalog at deployment time.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::batch::BatchIndex;
use crate::core::DefaultConstraint;

/// Generic statement emitted for unnamed default constraints.
pub const UNNAMED_DROP_STATEMENT: &str = "DROP CONSTRAINT ;";

static ALTER_TABLE_DROP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*ALTER\s+TABLE\s+\[(?P<schema>(?:[^\]]|\]\])+)\]\.\[(?P<table>(?:[^\]]|\]\])+)\]\s+DROP\s+CONSTRAINT\s*;\s*$",
    )
    .ok()
});

/// Result of [`correlate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationOutcome {
    pub script: String,
    /// Statements rewritten into a dynamic drop.
    pub replaced: usize,
    /// Statements without a matching dropped constraint.
    pub failed: usize,
    /// Lines the recognizer could not parse.
    pub unrecognized: usize,
}

/// Unnamed constraints of `old` that are absent from `new`, in `old` order.
pub fn dropped_unnamed_constraints(
    old: &[DefaultConstraint],
    new: &[DefaultConstraint],
) -> Vec<DefaultConstraint> {
    let remaining: HashSet<&DefaultConstraint> = new.iter().collect();
    old.iter()
        .filter(|c| c.is_unnamed() && !remaining.contains(c))
        .cloned()
        .collect()
}

/// Rewrite every generic drop statement in `script` using `candidates`.
///
/// Each candidate is used at most once; the first unused candidate on the
/// statement's table wins.
pub fn correlate(script: &str, candidates: &[DefaultConstraint]) -> CorrelationOutcome {
    let index = BatchIndex::new(script);
    let mut used = vec![false; candidates.len()];
    let mut output = String::with_capacity(script.len());
    let mut cursor = 0;
    let mut replaced = 0;
    let mut failed = 0;
    let mut unrecognized = 0;

    while let Some(found) = index.find(UNNAMED_DROP_STATEMENT, cursor) {
        let line_start = found.line_start(script).max(cursor);
        let line_end = script[found.statement_end..]
            .find('\n')
            .map(|i| found.statement_end + i)
            .unwrap_or(script.len());
        let line = script[line_start..line_end].trim_end_matches('\r');

        output.push_str(&script[cursor..line_start]);
        cursor = line_start + line.len();

        let Some(captures) = ALTER_TABLE_DROP.as_ref().and_then(|re| re.captures(line)) else {
            warn!("Unable to recognize unnamed constraint drop: {}", line.trim());
            unrecognized += 1;
            output.push_str(line);
            continue;
        };
        let schema = captures["schema"].replace("]]", "]");
        let table = captures["table"].replace("]]", "]");

        let candidate = candidates
            .iter()
            .enumerate()
            .find(|(i, c)| !used[*i] && c.is_on_table(&schema, &table));

        match candidate {
            Some((i, constraint)) => {
                used[i] = true;
                debug!("Replacing unnamed constraint drop for {}", constraint);
                output.push_str(&dynamic_drop(constraint));
                replaced += 1;
            }
            None => {
                output.push_str(line);
                failed += 1;
            }
        }
    }
    output.push_str(&script[cursor..]);

    if failed > 0 {
        warn!(
            "{} unnamed default constraint drop(s) could not be replaced",
            failed
        );
    }
    if unrecognized > 0 {
        warn!(
            "{} unnamed default constraint drop(s) were not recognized",
            unrecognized
        );
    }

    CorrelationOutcome {
        script: output,
        replaced,
        failed,
        unrecognized,
    }
}

fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Drop resolving the constraint name through `sys.default_constraints`.
///
/// Runs inside `sp_executesql` so several drops can share one batch.
fn dynamic_drop(constraint: &DefaultConstraint) -> String {
    format!(
        "EXEC sp_executesql N'
DECLARE @command NVARCHAR(MAX);
SELECT @command = N''ALTER TABLE '' + QUOTENAME(s.[name]) + N''.'' + QUOTENAME(t.[name]) + N'' DROP CONSTRAINT '' + QUOTENAME(dc.[name]) + N'';''
FROM sys.default_constraints AS dc
INNER JOIN sys.tables AS t ON dc.parent_object_id = t.[object_id]
INNER JOIN sys.schemas AS s ON t.[schema_id] = s.[schema_id]
INNER JOIN sys.columns AS c ON dc.parent_object_id = c.[object_id] AND dc.parent_column_id = c.column_id
WHERE s.[name] = @schema_name AND t.[name] = @table_name AND c.[name] = @column_name;
IF @command IS NOT NULL EXEC (@command);',
    N'@schema_name SYSNAME, @table_name SYSNAME, @column_name SYSNAME',
    @schema_name = N'{}', @table_name = N'{}', @column_name = N'{}';",
        sql_literal(&constraint.schema_name),
        sql_literal(&constraint.table_name),
        sql_literal(&constraint.column_name),
    )
}
