//! Running external tools (dotnet, SqlPackage) with cancellation.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{LifecycleError, Result};

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-empty lines of stdout followed by stderr.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Run `program` to completion, killing it if `cancel` fires first.
pub async fn run_tool<I, S>(program: &str, args: I, cancel: &CancellationToken) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Starting {:?}", command.as_std());

    let output = tokio::select! {
        output = command.output() => output.map_err(|e| {
            LifecycleError::environment(format!("Failed to start {}: {}", program, e))
        })?,
        _ = cancel.cancelled() => return Err(LifecycleError::Cancelled),
    };

    Ok(ToolOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
