//! Command line argument parsing.
//!
//! The tool is configured through the environment; the command line only
//! selects dry-run and the optional publish step. Unrecognized arguments
//! are dropped before parsing so wrappers may pass extra flags through.

use clap::{Parser, Subcommand};
use std::ffi::OsString;

/// Arguments clap is allowed to see
const KNOWN_ARGS: &[&str] = &["--dry-run", "publish", "-h", "--help", "-V", "--version"];

/// Build, bundle, sign, package and notarize a macOS application
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "dmg_release",
    version,
    about = "Turn a Rust desktop application into a signed, notarized disk image",
    long_about = "Build, bundle, sign, package and notarize a macOS desktop application.

Configuration comes from the environment:
  ENABLE_CODESIGN=true       sign the bundle and the disk image
  CODESIGN_IDENTITY=<text>   pick the identity whose name contains <text>
  ENABLE_NOTARIZE=true       notarize and staple the disk image (needs signing)
  NOTARY_PROFILE=<name>      notarytool keychain profile (default: notarytool-profile)

Usage:
  dmg_release                 run the packaging pipeline
  dmg_release --dry-run       show what would run without changing anything
  dmg_release publish         create a draft GitHub release with the disk image"
)]
pub struct Args {
    /// Skip every mutating external tool call
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Optional step to run instead of the pipeline
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create a draft GitHub release for the current version's disk image
    Publish,
}

impl Command {
    /// Name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Publish => "publish",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse_from(filter_args(std::env::args_os()))
    }

    /// Parse an explicit argument list, applying the same filtering
    pub fn parse_from_filtered<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(filter_args(args))
    }

    /// Name of the command being run
    pub fn command_name(&self) -> &'static str {
        self.command.map_or("package", |c| c.name())
    }
}

/// Keep the program name and the arguments the tool understands
pub fn filter_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<OsString> = args.next().into_iter().collect();

    for arg in args {
        if arg.to_str().is_some_and(|a| KNOWN_ARGS.contains(&a)) {
            kept.push(arg);
        } else {
            log::debug!("Ignoring unrecognized argument {:?}", arg);
        }
    }
    kept
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new() -> Self {
        Self {
            output: super::OutputManager::new(false),
        }
    }

    /// Configuration that prints errors only
    pub fn quiet() -> Self {
        Self {
            output: super::OutputManager::new(true),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Terminal write failures are not worth aborting a release over
impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print info message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print progress message
    pub fn progress_println(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}
