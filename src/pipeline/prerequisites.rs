//! Environment checks that run before any stage.

use crate::config::PipelineConfig;
use crate::error::{ReleaseError, Result};
use crate::tools::ToolProbe;

/// Tools every run needs
pub const REQUIRED_TOOLS: &[&str] = &["cargo", "iconutil", "hdiutil", "codesign", "security"];

/// Needed in addition when notarizing (`notarytool` and `stapler`)
pub const NOTARIZE_TOOLS: &[&str] = &["xcrun"];

/// Verifies the external tools are installed
pub struct PrerequisiteChecker<'a> {
    probe: &'a dyn ToolProbe,
}

impl<'a> PrerequisiteChecker<'a> {
    /// Create a checker backed by `probe`
    pub fn new(probe: &'a dyn ToolProbe) -> Self {
        Self { probe }
    }

    /// Names of the tools this configuration needs
    pub fn required_tools(config: &PipelineConfig) -> Vec<&'static str> {
        let mut tools = REQUIRED_TOOLS.to_vec();
        if config.enable_notarization {
            tools.extend_from_slice(NOTARIZE_TOOLS);
        }
        tools
    }

    /// Fail with every missing tool at once
    pub fn check(&self, config: &PipelineConfig) -> Result<()> {
        let missing: Vec<String> = Self::required_tools(config)
            .into_iter()
            .filter(|tool| !self.probe.is_available(tool))
            .map(String::from)
            .collect();

        if missing.is_empty() {
            log::debug!("All required tools are available");
            Ok(())
        } else {
            Err(ReleaseError::PrerequisiteMissing { missing })
        }
    }
}
