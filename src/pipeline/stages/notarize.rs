use super::names;
use crate::error::{ReleaseError, Result};
use crate::pipeline::artifact::ArtifactKind;
use crate::pipeline::stage::{Stage, StageContext};
use crate::tools::NotaryVerdict;

/// Submits the signed image for notarization and staples the ticket.
///
/// Blocks until the service answers; a rejection is never retried.
pub struct NotarizeStage;

impl Stage for NotarizeStage {
    fn name(&self) -> &'static str {
        names::NOTARIZE
    }

    fn is_enabled(&self, ctx: &StageContext<'_>) -> bool {
        ctx.config.enable_notarization && ctx.is_signed(ArtifactKind::DiskImage)
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let image = ctx.artifacts.take(ArtifactKind::DiskImage)?;
        let profile = &ctx.config.notary_profile;

        ctx.output.progress_println(&format!(
            "Submitting {} for notarization with profile '{}' (this can take several minutes)...",
            image.path().display(),
            profile
        ));

        match ctx.tools.notarizer.submit(image.path(), profile)? {
            NotaryVerdict::Accepted => {}
            NotaryVerdict::Rejected(report) => {
                return Err(ReleaseError::ExternalToolFailure {
                    tool: "xcrun notarytool submit".to_string(),
                    output: report,
                });
            }
        }

        ctx.tools.notarizer.staple(image.path())?;
        ctx.output
            .success_println(&format!("Notarized and stapled {}", image.path().display()));
        ctx.artifacts.put(image);
        Ok(())
    }
}
