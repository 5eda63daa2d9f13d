//! ICNS creation from an `.iconset` directory.

use super::{CommandRunner, IconConverter};
use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// `iconutil -c icns`
#[derive(Debug, Clone, Copy)]
pub struct Iconutil {
    runner: CommandRunner,
}

impl Iconutil {
    /// Create a converter
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

impl IconConverter for Iconutil {
    fn convert(&self, iconset: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new("iconutil");
        command
            .args(["-c", "icns"])
            .arg(iconset)
            .arg("-o")
            .arg(output);
        self.runner.mutate(command)?;
        Ok(())
    }
}
