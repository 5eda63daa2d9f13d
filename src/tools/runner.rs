//! Synchronous process execution shared by all system tools.

use crate::error::{ReleaseError, Result};
use std::process::Command;

/// Captured output of a finished tool
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Whether the process exited with status 0
    pub success: bool,
    /// True when dry-run suppressed the call
    pub skipped: bool,
}

impl ToolOutput {
    /// stderr followed by stdout, the way tools report diagnostics
    pub fn combined(&self) -> String {
        let mut text = self.stderr.trim_end().to_string();
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stdout);
        }
        text
    }
}

/// Runs external commands, suppressing mutating ones in dry-run mode
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    dry_run: bool,
}

impl CommandRunner {
    /// Create a runner
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Run a read-only command; runs even in dry-run mode
    pub fn query(&self, command: Command) -> Result<ToolOutput> {
        let line = command_line(&command);
        let output = execute(&line, command)?;
        ensure_success(line, output)
    }

    /// Run a command that changes files or remote state
    pub fn mutate(&self, command: Command) -> Result<ToolOutput> {
        let line = command_line(&command);
        let output = self.mutate_unchecked(command)?;
        ensure_success(line, output)
    }

    /// Like [`mutate`](Self::mutate) but hands back a failed exit status
    /// instead of turning it into an error
    pub fn mutate_unchecked(&self, command: Command) -> Result<ToolOutput> {
        let line = command_line(&command);
        if self.dry_run {
            log::info!("[dry-run] skipping: {line}");
            return Ok(ToolOutput {
                success: true,
                skipped: true,
                ..ToolOutput::default()
            });
        }
        execute(&line, command)
    }
}

/// Turn a non-zero exit into [`ReleaseError::ExternalToolFailure`]
pub fn ensure_success(line: String, output: ToolOutput) -> Result<ToolOutput> {
    if output.success || output.skipped {
        Ok(output)
    } else {
        Err(ReleaseError::ExternalToolFailure {
            tool: line,
            output: output.combined(),
        })
    }
}

fn execute(line: &str, mut command: Command) -> Result<ToolOutput> {
    log::debug!("Running: {line}");
    let output = command
        .output()
        .map_err(|e| ReleaseError::ExternalToolFailure {
            tool: line.to_string(),
            output: format!("failed to start: {e}"),
        })?;

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        skipped: false,
    })
}

/// Program and arguments as one display string
pub fn command_line(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
