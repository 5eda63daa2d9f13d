//! Draft release publishing for a finished disk image.
//!
//! The publisher derives the tag `v<version>`, refuses to go on if that tag
//! already exists, renders release notes and creates a draft release with
//! the image attached. Turning the draft into a public release is left to
//! the maintainer on the hosting platform.

mod notes;
mod tags;

pub use notes::{NOTES_TEMPLATE, ReleaseNotes, sha256_file};
pub use tags::GitTagRegistry;

use crate::error::{ReleaseError, Result};
use semver::Version;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Answers whether a release tag is already taken
pub trait TagRegistry {
    /// Check if tag exists
    fn tag_exists(&self, tag: &str) -> impl Future<Output = Result<bool>>;
}

/// A release to be created on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRelease {
    /// Tag name, `v<version>`
    pub tag: String,
    /// Release title
    pub name: String,
    /// Rendered release notes
    pub body: String,
    /// Mark as pre-release
    pub prerelease: bool,
}

/// A release resource created on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRelease {
    /// Platform release id
    pub id: u64,
    /// Web page of the release
    pub html_url: String,
}

/// Hosting platform that stores releases
pub trait ReleaseHost {
    /// Create a release in draft state
    fn create_draft(&self, release: &DraftRelease) -> impl Future<Output = Result<HostedRelease>>;

    /// Attach a file to a release, returning its download URL
    fn upload_asset(
        &self,
        release: &HostedRelease,
        path: &Path,
    ) -> impl Future<Output = Result<String>>;
}

impl<H: ReleaseHost> ReleaseHost for &H {
    fn create_draft(&self, release: &DraftRelease) -> impl Future<Output = Result<HostedRelease>> {
        (**self).create_draft(release)
    }

    fn upload_asset(
        &self,
        release: &HostedRelease,
        path: &Path,
    ) -> impl Future<Output = Result<String>> {
        (**self).upload_asset(release, path)
    }
}

/// What to publish
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    /// Application display name
    pub app_name: String,
    /// Version embedded in the image
    pub version: String,
    /// Finished disk image
    pub image: PathBuf,
}

/// Result of a publish attempt
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Tag the release was created for
    pub tag: String,
    /// Rendered notes
    pub notes: String,
    /// Whether the release is marked pre-release
    pub prerelease: bool,
    /// Draft release, absent in dry-run
    pub release: Option<HostedRelease>,
    /// Download URL of the uploaded image, absent in dry-run
    pub asset_url: Option<String>,
}

/// `v<version>`
pub fn release_tag(version: &str) -> String {
    format!("v{version}")
}

/// Pre-1.0 and pre-release versions are published as pre-releases
pub fn is_prerelease(version: &Version) -> bool {
    version.major == 0 || !version.pre.is_empty()
}

/// Creates draft releases, never touching the host when the tag is taken
pub struct ReleasePublisher<T, H> {
    tags: T,
    host: H,
    dry_run: bool,
}

impl<T: TagRegistry, H: ReleaseHost> ReleasePublisher<T, H> {
    /// Create a publisher
    pub fn new(tags: T, host: H, dry_run: bool) -> Self {
        Self {
            tags,
            host,
            dry_run,
        }
    }

    /// Publish `request` as a draft release
    pub async fn publish(&self, request: &ReleaseRequest) -> Result<PublishOutcome> {
        let tag = release_tag(&request.version);
        if self.tags.tag_exists(&tag).await? {
            return Err(ReleaseError::UniquenessViolation { tag });
        }

        let version = Version::parse(&request.version).map_err(|e| {
            ReleaseError::invalid_config(format!("invalid version '{}': {e}", request.version))
        })?;
        let prerelease = is_prerelease(&version);
        let notes = ReleaseNotes::for_image(&request.app_name, &request.version, &request.image)?
            .render()?;

        if self.dry_run {
            log::info!("[dry-run] would create draft release {tag}");
            return Ok(PublishOutcome {
                tag,
                notes,
                prerelease,
                release: None,
                asset_url: None,
            });
        }

        let draft = DraftRelease {
            tag: tag.clone(),
            name: format!("{} {}", request.app_name, request.version),
            body: notes.clone(),
            prerelease,
        };
        let release = self.host.create_draft(&draft).await?;
        log::info!("Created draft release {} ({})", tag, release.html_url);

        let asset_url = self.host.upload_asset(&release, &request.image).await?;
        Ok(PublishOutcome {
            tag,
            notes,
            prerelease,
            release: Some(release),
            asset_url: Some(asset_url),
        })
    }
}
