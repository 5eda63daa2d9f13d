//! Metadata and binary discovery from the project's Cargo.toml
//!
//! Bundle appearance is configured under `[package.metadata.bundle]`:
//!
//! ```toml
//! [package.metadata.bundle]
//! name = "DJ Uploader"
//! identifier = "com.weekendsuperhero.dj-uploader"
//! minimum_system_version = "11.0"
//! launch_argument = "--gui"
//! iconset = "assets/icon.iconset"
//!
//! [[package.metadata.bundle.document_types]]
//! name = "Audio File"
//! extensions = ["mp3", "m4a", "wav", "flac"]
//! role = "Viewer"
//! ```

use crate::error::{ErrorExt, ReleaseError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Version used when the project descriptor carries none
pub const FALLBACK_VERSION: &str = "0.1.0";

/// Project descriptor file name
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// A file type the application declares it can open
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentType {
    /// Human readable type name
    pub name: String,
    /// File extensions without the leading dot
    pub extensions: Vec<String>,
    /// Launch Services role (Viewer or Editor)
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "Viewer".to_string()
}

/// Raw `[package.metadata.bundle]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundleMetadata {
    /// Application display name
    pub name: Option<String>,
    /// Reverse-DNS bundle identifier
    pub identifier: Option<String>,
    /// LSMinimumSystemVersion
    pub minimum_system_version: String,
    /// LSApplicationCategoryType
    pub category: Option<String>,
    /// NSHumanReadableCopyright
    pub copyright: Option<String>,
    /// The one argument the launcher passes to the binary
    pub launch_argument: String,
    /// Iconset directory, relative to the project root
    pub iconset: PathBuf,
    /// Supported file-type associations
    pub document_types: Vec<DocumentType>,
}

impl Default for BundleMetadata {
    fn default() -> Self {
        Self {
            name: None,
            identifier: None,
            minimum_system_version: "11.0".to_string(),
            category: Some("public.app-category.music".to_string()),
            copyright: None,
            launch_argument: "--gui".to_string(),
            iconset: PathBuf::from("assets/icon.iconset"),
            document_types: vec![DocumentType {
                name: "Audio File".to_string(),
                extensions: ["mp3", "m4a", "wav", "flac"]
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
                role: default_role(),
            }],
        }
    }
}

/// Everything the pipeline needs to know about the project
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    /// Package name from Cargo.toml
    pub package_name: String,
    /// Package version from Cargo.toml, if present
    pub version: Option<String>,
    /// Name of the release binary
    pub binary_name: String,
    /// Repository URL from Cargo.toml
    pub repository: Option<String>,
    /// Bundle settings
    pub bundle: BundleMetadata,
}

impl ProjectManifest {
    /// Load `Cargo.toml` from the project root.
    ///
    /// A missing descriptor is not an error: names are derived from the
    /// directory and the version is left unset so the caller can fall back.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            let name = root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("app")
                .to_string();
            log::debug!("No {} at {}, using defaults", MANIFEST_FILE, root.display());
            return Ok(Self::with_defaults(name));
        }

        let content = std::fs::read_to_string(&path).fs_context("reading manifest", &path)?;
        Self::parse(&content)
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let package = table.get("package").ok_or_else(|| {
            ReleaseError::invalid_config(format!("No [package] section in {MANIFEST_FILE}"))
        })?;

        let package_name = package
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ReleaseError::invalid_config("Missing 'name' in [package]"))?
            .to_string();

        // Workspace-inherited versions (`version.workspace = true`) are not strings
        let version = package
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from);

        // Try [[bin]] section first, then fall back to the package name
        let binary_name = table
            .get("bin")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|first| first.get("name"))
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| package_name.clone());

        let repository = package
            .get("repository")
            .and_then(|v| v.as_str())
            .map(String::from);

        let bundle = match package.get("metadata").and_then(|m| m.get("bundle")) {
            Some(value) => value.clone().try_into::<BundleMetadata>()?,
            None => BundleMetadata::default(),
        };

        Ok(Self {
            package_name,
            version,
            binary_name,
            repository,
            bundle,
        })
    }

    fn with_defaults(name: String) -> Self {
        Self {
            binary_name: name.clone(),
            package_name: name,
            version: None,
            repository: None,
            bundle: BundleMetadata::default(),
        }
    }

    /// Version to embed, and whether it is the fallback
    pub fn version_or_fallback(&self) -> (String, bool) {
        match &self.version {
            Some(v) if !v.trim().is_empty() => (v.trim().to_string(), false),
            _ => (FALLBACK_VERSION.to_string(), true),
        }
    }

    /// Display name of the application
    pub fn app_name(&self) -> String {
        self.bundle
            .name
            .clone()
            .unwrap_or_else(|| title_case(&self.package_name))
    }

    /// Bundle identifier, derived from the package name when not configured
    pub fn identifier(&self) -> String {
        self.bundle.identifier.clone().unwrap_or_else(|| {
            let slug: String = self
                .package_name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            format!("com.{}.app", slug.to_ascii_lowercase())
        })
    }
}

/// `dj-uploader` → `Dj Uploader`
fn title_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
