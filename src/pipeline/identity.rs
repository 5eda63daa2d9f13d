//! Signing identity resolution.
//!
//! The trust store is only ever read. With a hint the resolver does a
//! case-sensitive substring match on display names; without one it looks at
//! trusted Developer ID identities and, when more than one exists, asks an
//! [`IdentitySelector`] which to use.

use crate::error::{ReleaseError, Result};
use crate::tools::IdentityStore;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Certificate family of a signing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Apple Development / Mac Developer certificates
    Development,
    /// Developer ID Application certificates (distribution outside the store)
    DeveloperId,
}

impl IdentityKind {
    /// Classify a display name as reported by the trust store
    pub fn from_display_name(name: &str) -> Self {
        if name.starts_with("Developer ID Application:") {
            IdentityKind::DeveloperId
        } else {
            IdentityKind::Development
        }
    }
}

/// A certificate plus private key usable for code signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    /// Common name shown by the trust store
    pub display_name: String,
    /// Certificate family
    pub kind: IdentityKind,
    /// Whether the trust store considers the identity valid
    pub trusted: bool,
    /// SHA-1 fingerprint, when the store reports one
    pub fingerprint: Option<String>,
}

impl SigningIdentity {
    /// Value passed to `codesign --sign`
    ///
    /// The fingerprint is unambiguous even when two certificates share a name.
    pub fn signing_reference(&self) -> &str {
        self.fingerprint.as_deref().unwrap_or(&self.display_name)
    }
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Chooses one identity out of several candidates
pub trait IdentitySelector {
    /// Return the 0-based index of the chosen candidate
    fn select(&mut self, candidates: &[SigningIdentity]) -> Result<usize>;
}

/// Parse a 1-based menu choice
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Interactive selection on a terminal, re-prompting until the input is valid
pub struct TerminalSelector {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl TerminalSelector {
    /// Selector reading stdin and writing the menu to stdout
    pub fn stdio() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    /// Selector over arbitrary streams
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }
}

impl IdentitySelector for TerminalSelector {
    fn select(&mut self, candidates: &[SigningIdentity]) -> Result<usize> {
        writeln!(self.output, "Multiple Developer ID identities found:")?;
        for (i, identity) in candidates.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, identity.display_name)?;
        }

        loop {
            write!(self.output, "Select identity [1-{}]: ", candidates.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(ReleaseError::invalid_config(
                    "no signing identity selected (input closed)",
                ));
            }

            match parse_choice(&line, candidates.len()) {
                Some(index) => return Ok(index),
                None => writeln!(
                    self.output,
                    "Invalid choice '{}'. Enter a number between 1 and {}.",
                    line.trim(),
                    candidates.len()
                )?,
            }
        }
    }
}

/// Non-interactive selection with a pre-supplied 1-based index
#[derive(Debug, Clone, Copy)]
pub struct PresetSelector {
    choice: usize,
}

impl PresetSelector {
    /// Always answer with `choice` (1-based)
    pub fn new(choice: usize) -> Self {
        Self { choice }
    }
}

impl IdentitySelector for PresetSelector {
    fn select(&mut self, candidates: &[SigningIdentity]) -> Result<usize> {
        parse_choice(&self.choice.to_string(), candidates.len()).ok_or_else(|| {
            ReleaseError::invalid_config(format!(
                "identity choice {} is out of range 1-{}",
                self.choice,
                candidates.len()
            ))
        })
    }
}

/// Resolve exactly one signing identity
pub fn resolve_identity(
    store: &dyn IdentityStore,
    selector: &mut dyn IdentitySelector,
    hint: Option<&str>,
) -> Result<SigningIdentity> {
    let identities = store.find_identities()?;

    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        return resolve_hinted(identities, hint);
    }

    let mut candidates: Vec<SigningIdentity> = identities
        .into_iter()
        .filter(|i| i.kind == IdentityKind::DeveloperId && i.trusted)
        .collect();

    match candidates.len() {
        0 => Err(ReleaseError::PrerequisiteMissing {
            missing: vec!["trusted Developer ID Application signing identity".to_string()],
        }),
        1 => {
            let identity = candidates.remove(0);
            log::info!("Using the only Developer ID identity: {}", identity);
            Ok(identity)
        }
        _ => {
            let index = selector.select(&candidates)?;
            if index >= candidates.len() {
                return Err(ReleaseError::invalid_config(format!(
                    "identity selector returned out-of-range index {index}"
                )));
            }
            Ok(candidates.swap_remove(index))
        }
    }
}

fn resolve_hinted(identities: Vec<SigningIdentity>, hint: &str) -> Result<SigningIdentity> {
    let matches: Vec<SigningIdentity> = identities
        .into_iter()
        .filter(|i| i.display_name.contains(hint))
        .collect();

    if matches.is_empty() {
        return Err(ReleaseError::invalid_config(format!(
            "no signing identity matches CODESIGN_IDENTITY '{hint}'"
        )));
    }

    let trusted: Vec<SigningIdentity> = matches.into_iter().filter(|i| i.trusted).collect();
    if trusted.len() > 1 {
        log::warn!(
            "CODESIGN_IDENTITY '{}' matches {} identities, using '{}'",
            hint,
            trusted.len(),
            trusted[0]
        );
    }

    trusted.into_iter().next().ok_or_else(|| {
        ReleaseError::invalid_config(format!(
            "signing identity matching '{hint}' is not trusted (revoked or expired)"
        ))
    })
}
