//! Command execution with error reporting and exit codes.

mod package;
mod publish;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ReleaseError, Result};
use crate::metadata::{MANIFEST_FILE, ProjectManifest};

pub use package::{execute_package, print_summary};
pub use publish::execute_publish;

/// Execute the command selected by `args` and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::new();

    let result = match args.command {
        None => execute_package(&args, &config),
        Some(Command::Publish) => execute_publish(&args, &config).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            report_failure(&config, args.command_name(), &e);
            Ok(1)
        }
    }
}

/// Print a failure with its stage, kind and recovery suggestions
pub fn report_failure(config: &RuntimeConfig, command: &str, error: &ReleaseError) {
    config.error_println(&failure_message(command, error));

    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        config.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            config.println(&format!("  • {}", suggestion));
        }
    }
}

/// Project version, warning when the fallback is used
fn project_version(manifest: &ProjectManifest, config: &RuntimeConfig) -> String {
    let (version, is_fallback) = manifest.version_or_fallback();
    if is_fallback {
        config.warning_println(&format!(
            "No version found in {MANIFEST_FILE}, using fallback {version}"
        ));
    }
    version
}

/// One-line failure description naming the failing stage once
pub fn failure_message(command: &str, error: &ReleaseError) -> String {
    match error {
        ReleaseError::Stage { stage, source } => {
            format!("{command}: stage '{stage}' failed ({}): {source}", error.kind())
        }
        _ => format!("{command} failed ({}): {error}", error.kind()),
    }
}
