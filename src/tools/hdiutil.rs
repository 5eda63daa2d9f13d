//! Disk image creation with the native hdiutil tool.

use super::{CommandRunner, ImageBuilder};
use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// `hdiutil create ... -format UDZO`
#[derive(Debug, Clone, Copy)]
pub struct Hdiutil {
    runner: CommandRunner,
}

impl Hdiutil {
    /// Create an image builder
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

impl ImageBuilder for Hdiutil {
    fn create(&self, volume_name: &str, source_dir: &Path, output: &Path) -> Result<()> {
        log::info!("Creating UDZO disk image {}", output.display());
        let mut command = Command::new("hdiutil");
        command
            .args(["create", "-volname", volume_name, "-srcfolder"])
            .arg(source_dir)
            .args(["-ov", "-format", "UDZO"])
            .arg(output);
        self.runner.mutate(command)?;
        Ok(())
    }
}
