//! `publish`: create a draft GitHub release for the built disk image.

use super::project_version;
use crate::cli::{Args, RuntimeConfig};
use crate::config::EnvConfig;
use crate::error::{ReleaseError, Result};
use crate::github::GitHubReleaseHost;
use crate::layout::ProjectLayout;
use crate::metadata::ProjectManifest;
use crate::publish::{GitTagRegistry, ReleasePublisher, ReleaseRequest};

/// Publish the current version's disk image as a draft release
pub async fn execute_publish(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let root = std::env::current_dir()?;
    let manifest = ProjectManifest::load(&root)?;
    let version = project_version(&manifest, config);
    let layout = ProjectLayout::new(&root, &manifest);

    let image = layout.image_path(&version);
    if !image.is_file() {
        return Err(ReleaseError::invalid_config(format!(
            "disk image {} not found; run dmg_release first",
            image.display()
        )));
    }

    let env = EnvConfig::from_process();
    let host = GitHubReleaseHost::from_env(&env, manifest.repository.as_deref())?;
    config.section(&format!("Publishing {} to {}", image.display(), host.repo()));

    let publisher = ReleasePublisher::new(GitTagRegistry::new(&root), host, args.dry_run);
    let request = ReleaseRequest {
        app_name: layout.app_name().to_string(),
        version,
        image,
    };
    let outcome = publisher.publish(&request).await?;

    match (&outcome.release, &outcome.asset_url) {
        (Some(release), Some(asset)) => {
            config.success_println(&format!("Draft release {} created", outcome.tag));
            config.indent(&release.html_url);
            config.indent(asset);
            config.info_println("Review the draft on GitHub and publish it when ready");
        }
        _ => {
            config.info_println(&format!("Dry run: would create draft release {}", outcome.tag));
            config.println(&outcome.notes);
        }
    }
    Ok(0)
}
