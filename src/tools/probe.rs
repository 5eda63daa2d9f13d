//! Tool presence checks.

use super::ToolProbe;

/// Looks tools up on `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn is_available(&self, tool: &str) -> bool {
        match which::which(tool) {
            Ok(path) => {
                log::debug!("Found {} at {}", tool, path.display());
                true
            }
            Err(e) => {
                log::debug!("{} not found in PATH: {}", tool, e);
                false
            }
        }
    }
}
