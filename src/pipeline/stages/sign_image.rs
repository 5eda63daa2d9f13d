use super::names;
use crate::error::Result;
use crate::pipeline::artifact::ArtifactKind;
use crate::pipeline::stage::{Stage, StageContext};
use crate::tools::SignOptions;

/// Signs the finished disk image, without entitlements
pub struct SignImageStage;

impl Stage for SignImageStage {
    fn name(&self) -> &'static str {
        names::SIGN_IMAGE
    }

    /// Only after the bundle inside the image was signed in this run
    fn is_enabled(&self, ctx: &StageContext<'_>) -> bool {
        ctx.config.enable_signing && ctx.has_completed(names::SIGN)
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let identity = ctx.signing_identity()?;
        let mut image = ctx.artifacts.take(ArtifactKind::DiskImage)?;

        ctx.tools
            .signer
            .sign(image.path(), identity, SignOptions::default())?;

        image.signed = true;
        ctx.output
            .success_println(&format!("Signed {}", image.path().display()));
        ctx.artifacts.put(image);
        Ok(())
    }
}
