//! Conventional paths for one project.
//!
//! Bundles are created in `target/release/bundle/`:
//! - `bundle/macos/MyApp.app` - Application bundle
//! - `bundle/dmg/MyApp-1.0.0.dmg` - Disk image
//! - `bundle/entitlements.plist` - Entitlements used while signing

use crate::metadata::ProjectManifest;
use std::path::{Path, PathBuf};

/// Resolved paths and names for a project
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    app_name: String,
    binary_name: String,
    iconset: PathBuf,
}

impl ProjectLayout {
    /// Derive the layout from a project root and its manifest
    pub fn new(root: impl Into<PathBuf>, manifest: &ProjectManifest) -> Self {
        let root = root.into();
        let iconset = root.join(&manifest.bundle.iconset);
        Self {
            root,
            app_name: manifest.app_name(),
            binary_name: manifest.binary_name.clone(),
            iconset,
        }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Application display name
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Release binary name
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Name of the launcher script inside `Contents/MacOS`
    pub fn launcher_name(&self) -> String {
        format!("{}-launcher", self.binary_name)
    }

    /// `target/release`
    pub fn release_dir(&self) -> PathBuf {
        self.root.join("target").join("release")
    }

    /// Where the compiler toolchain leaves the release binary
    pub fn binary_path(&self) -> PathBuf {
        self.release_dir().join(&self.binary_name)
    }

    /// `target/release/bundle`
    pub fn bundle_root(&self) -> PathBuf {
        self.release_dir().join("bundle")
    }

    /// `<AppName>.app`
    pub fn bundle_path(&self) -> PathBuf {
        self.bundle_root()
            .join("macos")
            .join(format!("{}.app", self.app_name))
    }

    /// `<AppName>.app/Contents`
    pub fn contents_dir(&self) -> PathBuf {
        self.bundle_path().join("Contents")
    }

    /// Directory holding the disk image
    pub fn image_dir(&self) -> PathBuf {
        self.bundle_root().join("dmg")
    }

    /// `<AppName>-<version>.dmg`
    pub fn image_path(&self, version: &str) -> PathBuf {
        self.image_dir()
            .join(format!("{}-{}.dmg", self.app_name, version))
    }

    /// Entitlements descriptor written when signing
    pub fn entitlements_path(&self) -> PathBuf {
        self.bundle_root().join("entitlements.plist")
    }

    /// Iconset directory consumed by the icon converter
    pub fn iconset_dir(&self) -> &Path {
        &self.iconset
    }

    /// Icon file name inside `Contents/Resources`
    pub fn icon_file_name(&self) -> String {
        format!("{}.icns", self.app_name)
    }
}
