//! macOS code signing.
//!
//! Signatures use the secure timestamp server; `--force` replaces any
//! signature left by a previous run.

use super::{CommandRunner, SignOptions, Signer, command_line};
use crate::error::{ReleaseError, Result};
use crate::pipeline::SigningIdentity;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// `codesign`
#[derive(Debug, Clone, Copy)]
pub struct Codesign {
    runner: CommandRunner,
}

impl Codesign {
    /// Create a signer
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

/// Arguments for one `codesign --sign` invocation
pub(crate) fn sign_args(
    path: &Path,
    identity: &SigningIdentity,
    options: SignOptions<'_>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--force".into(), "--timestamp".into()];
    if options.hardened_runtime {
        args.push("--options".into());
        args.push("runtime".into());
    }
    if options.deep {
        args.push("--deep".into());
    }
    if let Some(entitlements) = options.entitlements {
        args.push("--entitlements".into());
        args.push(entitlements.as_os_str().to_owned());
    }
    args.push("--sign".into());
    args.push(identity.signing_reference().into());
    args.push(path.as_os_str().to_owned());
    args
}

impl Signer for Codesign {
    fn sign(&self, path: &Path, identity: &SigningIdentity, options: SignOptions<'_>) -> Result<()> {
        log::info!("Signing {} with identity '{}'", path.display(), identity);
        let mut command = Command::new("codesign");
        command.args(sign_args(path, identity, options));
        self.runner.mutate(command)?;
        Ok(())
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let mut command = Command::new("codesign");
        command
            .args(["--verify", "--deep", "--strict", "--verbose=2"])
            .arg(path);
        let line = command_line(&command);

        // A skipped verification has nothing to look at
        let output = self.runner.mutate_unchecked(command)?;
        if output.success {
            return Ok(());
        }

        log::debug!("{} rejected {}", line, path.display());
        Err(ReleaseError::VerificationFailure {
            path: path.to_path_buf(),
            output: output.combined(),
        })
    }
}
