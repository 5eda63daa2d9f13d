//! Narrow interfaces to the external tools the pipeline drives.
//!
//! Stages only ever talk to these traits. The system implementations shell
//! out to the macOS utilities; tests substitute in-memory fakes.
//!
//! | Trait | System tool |
//! |-------|-------------|
//! | [`Compiler`] | `cargo build --release` |
//! | [`IconConverter`] | `iconutil` |
//! | [`Signer`] | `codesign` |
//! | [`ImageBuilder`] | `hdiutil` |
//! | [`Notarizer`] | `xcrun notarytool`, `xcrun stapler` |
//! | [`IdentityStore`] | `security find-identity` |
//! | [`ToolProbe`] | `PATH` lookup |

mod cargo;
mod codesign;
mod hdiutil;
mod iconutil;
mod notarytool;
mod probe;
mod runner;
mod security;

pub use cargo::CargoCompiler;
pub use codesign::Codesign;
pub use hdiutil::Hdiutil;
pub use iconutil::Iconutil;
pub use notarytool::NotaryTool;
pub use probe::PathProbe;
pub use runner::{CommandRunner, ToolOutput, command_line, ensure_success};
pub use security::{SecurityIdentityStore, parse_find_identity};

use crate::error::Result;
use crate::pipeline::SigningIdentity;
use std::path::Path;

/// Produces the release binary
pub trait Compiler {
    /// Build `binary` in release mode inside `project_root`
    fn build_release(&self, project_root: &Path, binary: &str) -> Result<()>;
}

/// Converts an iconset directory into a single icon file
pub trait IconConverter {
    /// Write `output` from the images in `iconset`
    fn convert(&self, iconset: &Path, output: &Path) -> Result<()>;
}

/// How one signature is applied
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOptions<'a> {
    /// Entitlements descriptor to embed
    pub entitlements: Option<&'a Path>,
    /// Enable the hardened runtime (required for notarization)
    pub hardened_runtime: bool,
    /// Sign nested code as well
    pub deep: bool,
}

/// Applies and verifies code signatures
pub trait Signer {
    /// Sign `path` with `identity`, replacing any existing signature
    fn sign(&self, path: &Path, identity: &SigningIdentity, options: SignOptions<'_>) -> Result<()>;

    /// Strict deep verification; fails with `VerificationFailure`
    fn verify(&self, path: &Path) -> Result<()>;
}

/// Creates compressed read-only disk images
pub trait ImageBuilder {
    /// Turn `source_dir` into the image at `output`
    fn create(&self, volume_name: &str, source_dir: &Path, output: &Path) -> Result<()>;
}

/// Outcome of a notarization submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotaryVerdict {
    /// The service vouched for the artifact
    Accepted,
    /// The service refused it; carries the service's log text
    Rejected(String),
}

/// Submits artifacts to the notarization service
pub trait Notarizer {
    /// Submit and block until the service decides
    fn submit(&self, artifact: &Path, profile: &str) -> Result<NotaryVerdict>;

    /// Attach the accepted ticket to the artifact
    fn staple(&self, artifact: &Path) -> Result<()>;
}

/// Read-only view of the local trust store
pub trait IdentityStore {
    /// All code-signing identities, in the store's listing order
    fn find_identities(&self) -> Result<Vec<SigningIdentity>>;
}

/// Answers whether a tool can be invoked
pub trait ToolProbe {
    /// True if `tool` is on the search path
    fn is_available(&self, tool: &str) -> bool;
}

/// The full set of collaborators a pipeline run needs
pub struct Toolset {
    /// Tool presence checks
    pub probe: Box<dyn ToolProbe>,
    /// Compiler toolchain
    pub compiler: Box<dyn Compiler>,
    /// Icon converter
    pub icons: Box<dyn IconConverter>,
    /// Code signing tool
    pub signer: Box<dyn Signer>,
    /// Disk image tool
    pub images: Box<dyn ImageBuilder>,
    /// Notarization service client
    pub notarizer: Box<dyn Notarizer>,
    /// Trust store query
    pub identities: Box<dyn IdentityStore>,
}

impl Toolset {
    /// The real macOS utilities; mutating calls are skipped when `dry_run`
    pub fn system(dry_run: bool) -> Self {
        let runner = CommandRunner::new(dry_run);
        Self {
            probe: Box::new(PathProbe),
            compiler: Box::new(CargoCompiler::new(runner)),
            icons: Box::new(Iconutil::new(runner)),
            signer: Box::new(Codesign::new(runner)),
            images: Box::new(Hdiutil::new(runner)),
            notarizer: Box::new(NotaryTool::new(runner)),
            identities: Box::new(SecurityIdentityStore::new(runner)),
        }
    }
}
