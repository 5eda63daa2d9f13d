use super::names;
use crate::error::{Context, ErrorExt, Result};
use crate::pipeline::artifact::{Artifact, ArtifactKind};
use crate::pipeline::stage::{Stage, StageContext};
use crate::utils::fs;
use std::path::Path;

/// Drag-to-install disk image: the bundle next to an `/Applications` link
pub struct PackageStage;

impl Stage for PackageStage {
    fn name(&self) -> &'static str {
        names::PACKAGE
    }

    fn is_enabled(&self, _ctx: &StageContext<'_>) -> bool {
        true
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let layout = ctx.layout;
        let bundle = ctx.artifacts.take(ArtifactKind::Bundle)?;
        let image_path = layout.image_path(&ctx.config.version);

        fs::create_dir_all(&layout.image_dir())?;
        fs::remove_path(&image_path)?;

        // Removed on drop, so every exit path below cleans up
        let staging = tempfile::Builder::new()
            .prefix("dmg-staging-")
            .tempdir_in(layout.bundle_root())
            .fs_context("creating staging directory", layout.bundle_root())?;

        let app_dir_name = bundle
            .path()
            .file_name()
            .context("bundle path has no file name")?;
        let staged_app = staging.path().join(app_dir_name);
        log::debug!("Copying .app to staging: {}", staged_app.display());
        fs::copy_dir(bundle.path(), &staged_app)?;

        fs::symlink(Path::new("/Applications"), &staging.path().join("Applications"))?;

        ctx.output
            .progress_println(&format!("Creating {}...", image_path.display()));
        ctx.tools
            .images
            .create(layout.app_name(), staging.path(), &image_path)?;

        let staging_path = staging.path().to_path_buf();
        staging
            .close()
            .fs_context("removing staging directory", staging_path)?;

        ctx.artifacts.put(bundle);
        ctx.artifacts
            .put(Artifact::new(image_path.clone(), ArtifactKind::DiskImage));
        ctx.output
            .success_println(&format!("Created {}", image_path.display()));
        Ok(())
    }
}
