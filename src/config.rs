//! Run configuration.
//!
//! The environment is read exactly once into an [`EnvConfig`] snapshot and
//! turned into an immutable [`PipelineConfig`] that is handed to the
//! orchestrator. Nothing downstream reads process environment directly.

use crate::error::{ReleaseError, Result};
use std::collections::HashMap;

/// Notary keychain profile used when `NOTARY_PROFILE` is unset
pub const DEFAULT_NOTARY_PROFILE: &str = "notarytool-profile";

/// Environment variable enabling code signing
pub const ENV_ENABLE_CODESIGN: &str = "ENABLE_CODESIGN";
/// Environment variable naming the signing identity (substring match)
pub const ENV_CODESIGN_IDENTITY: &str = "CODESIGN_IDENTITY";
/// Environment variable enabling notarization
pub const ENV_ENABLE_NOTARIZE: &str = "ENABLE_NOTARIZE";
/// Environment variable naming the stored notarytool credentials
pub const ENV_NOTARY_PROFILE: &str = "NOTARY_PROFILE";

/// Immutable snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a variable's value
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Get a variable's value, treating blank values as unset
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
    }

    /// Parse a boolean flag, `default` when unset
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.vars.get(key) {
            None => Ok(default),
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ReleaseError::invalid_config(format!(
                    "{key} must be a boolean (true/false/1/0/yes/no), got '{raw}'"
                ))
            }),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Version embedded in the bundle and the image name
    pub version: String,
    /// Run the Sign and SignImage stages
    pub enable_signing: bool,
    /// Run the Notarize stage
    pub enable_notarization: bool,
    /// Substring of the signing identity's display name
    pub identity_hint: Option<String>,
    /// notarytool keychain profile name
    pub notary_profile: String,
    /// Suppress mutating external tool calls
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Read the pipeline flags from an environment snapshot
    pub fn from_env(env: &EnvConfig, version: impl Into<String>, dry_run: bool) -> Result<Self> {
        Ok(Self {
            version: version.into(),
            enable_signing: env.get_bool(ENV_ENABLE_CODESIGN, false)?,
            enable_notarization: env.get_bool(ENV_ENABLE_NOTARIZE, false)?,
            identity_hint: env.get_non_empty(ENV_CODESIGN_IDENTITY),
            notary_profile: env
                .get_non_empty(ENV_NOTARY_PROFILE)
                .unwrap_or_else(|| DEFAULT_NOTARY_PROFILE.to_string()),
            dry_run,
        })
    }

    /// Check the configuration invariants
    ///
    /// Notarization without signing is rejected outright rather than
    /// silently skipped.
    pub fn validate(&self) -> Result<()> {
        if self.enable_notarization && !self.enable_signing {
            return Err(ReleaseError::invalid_config(format!(
                "{ENV_ENABLE_NOTARIZE}=true requires {ENV_ENABLE_CODESIGN}=true \
                 (a disk image cannot be notarized unless it is signed)"
            )));
        }

        if self.version.trim().is_empty() {
            return Err(ReleaseError::invalid_config("version must not be empty"));
        }

        semver::Version::parse(&self.version).map_err(|e| {
            ReleaseError::invalid_config(format!("invalid version '{}': {e}", self.version))
        })?;

        if self.enable_notarization && self.notary_profile.trim().is_empty() {
            return Err(ReleaseError::invalid_config(format!(
                "{ENV_NOTARY_PROFILE} must name a stored notarytool profile"
            )));
        }

        Ok(())
    }
}
