use super::names;
use crate::error::{ReleaseError, Result};
use crate::pipeline::artifact::{Artifact, ArtifactKind};
use crate::pipeline::stage::{Stage, StageContext};

/// Compiles the application in release mode
pub struct BuildStage;

impl Stage for BuildStage {
    fn name(&self) -> &'static str {
        names::BUILD
    }

    fn is_enabled(&self, _ctx: &StageContext<'_>) -> bool {
        true
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let binary = ctx.layout.binary_name();
        ctx.output
            .progress_println(&format!("Building {binary} in release mode..."));
        ctx.tools
            .compiler
            .build_release(ctx.layout.root(), binary)?;

        let path = ctx.layout.binary_path();
        if !path.is_file() && !ctx.config.dry_run {
            return Err(ReleaseError::PrerequisiteMissing {
                missing: vec![format!("release binary at {}", path.display())],
            });
        }

        log::debug!("Release binary: {}", path.display());
        ctx.artifacts.put(Artifact::new(path, ArtifactKind::Binary));
        Ok(())
    }
}
