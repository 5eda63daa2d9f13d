//! Notarization through `xcrun notarytool` and `xcrun stapler`.

use super::{CommandRunner, Notarizer, NotaryVerdict, command_line, ensure_success};
use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// Apple notary service client using a stored keychain profile
#[derive(Debug, Clone, Copy)]
pub struct NotaryTool {
    runner: CommandRunner,
}

impl NotaryTool {
    /// Create a notarizer
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

/// Read the final `status:` line of a `notarytool submit --wait` report
pub(crate) fn parse_verdict(report: &str) -> NotaryVerdict {
    let status = report
        .lines()
        .filter_map(|line| line.trim().strip_prefix("status:"))
        .map(str::trim)
        .last();

    match status {
        Some("Accepted") => NotaryVerdict::Accepted,
        _ => NotaryVerdict::Rejected(report.trim().to_string()),
    }
}

impl Notarizer for NotaryTool {
    fn submit(&self, artifact: &Path, profile: &str) -> Result<NotaryVerdict> {
        let mut command = Command::new("xcrun");
        command
            .args(["notarytool", "submit"])
            .arg(artifact)
            .args(["--keychain-profile", profile, "--wait"]);
        let line = command_line(&command);

        let output = self.runner.mutate_unchecked(command)?;
        if output.skipped {
            return Ok(NotaryVerdict::Accepted);
        }

        // notarytool exits 0 for an Invalid verdict, so the report decides
        let verdict = parse_verdict(&output.combined());
        if verdict == NotaryVerdict::Accepted {
            return Ok(verdict);
        }
        if !output.success && !output.stdout.contains("status:") {
            ensure_success(line, output)?;
        }
        Ok(verdict)
    }

    fn staple(&self, artifact: &Path) -> Result<()> {
        let mut command = Command::new("xcrun");
        command.args(["stapler", "staple"]).arg(artifact);
        self.runner.mutate(command)?;
        Ok(())
    }
}
