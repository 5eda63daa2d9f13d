//! Trust store queries through `security find-identity`.
//!
//! Listing lines look like:
//!
//! ```text
//!   1) 0123456789ABCDEF0123456789ABCDEF01234567 "Developer ID Application: Jane Doe (TEAM1)"
//!   2) 89ABCDEF0123456789ABCDEF0123456789ABCDEF "Apple Development: jane@example.com (AAAA)" (CSSMERR_TP_CERT_REVOKED)
//! ```
//!
//! The same identity is printed once under "Policy" and again under
//! "Matching identities", so entries are de-duplicated by fingerprint.

use super::{CommandRunner, IdentityStore};
use crate::error::Result;
use crate::pipeline::{IdentityKind, SigningIdentity};
use regex::Regex;
use std::collections::HashSet;
use std::process::Command;
use std::sync::LazyLock;

static IDENTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\d+\)\s+([0-9A-F]{40})\s+"(.+)"(?:\s+\((CSSMERR_[A-Z_]+)\))?\s*$"#)
        .unwrap_or_else(|e| panic!("identity pattern is invalid: {e}"))
});

/// Parse `security find-identity -p codesigning` output
pub fn parse_find_identity(listing: &str) -> Vec<SigningIdentity> {
    let mut seen = HashSet::new();
    let mut identities = Vec::new();

    for line in listing.lines() {
        let Some(caps) = IDENTITY_LINE.captures(line) else {
            continue;
        };
        let fingerprint = caps[1].to_string();
        if !seen.insert(fingerprint.clone()) {
            continue;
        }
        let display_name = caps[2].to_string();
        identities.push(SigningIdentity {
            kind: IdentityKind::from_display_name(&display_name),
            trusted: caps.get(3).is_none(),
            display_name,
            fingerprint: Some(fingerprint),
        });
    }

    identities
}

/// Reads the login keychain via `security`
#[derive(Debug, Clone, Copy)]
pub struct SecurityIdentityStore {
    runner: CommandRunner,
}

impl SecurityIdentityStore {
    /// Create a store reader
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

impl IdentityStore for SecurityIdentityStore {
    fn find_identities(&self) -> Result<Vec<SigningIdentity>> {
        let mut command = Command::new("security");
        command.args(["find-identity", "-p", "codesigning"]);
        let output = self.runner.query(command)?;
        let identities = parse_find_identity(&output.stdout);
        log::debug!("Trust store lists {} signing identities", identities.len());
        Ok(identities)
    }
}
