//! The build → bundle → sign → package → notarize pipeline.
//!
//! [`Pipeline::run`] validates the configuration, checks the installed
//! tools, resolves a signing identity when signing is enabled and then
//! drives the stages in fixed order:
//!
//! `Build → Bundle → [Sign] → Package → [SignImage] → [Notarize]`
//!
//! The first failing stage aborts the run. Outputs already written stay on
//! disk; every stage recreates its own output, so a re-run is always safe.

mod artifact;
mod identity;
mod prerequisites;
mod stage;
pub mod stages;

pub use artifact::{Artifact, ArtifactKind, ArtifactSet};
pub use identity::{
    IdentityKind, IdentitySelector, PresetSelector, SigningIdentity, TerminalSelector,
    parse_choice, resolve_identity,
};
pub use prerequisites::{NOTARIZE_TOOLS, PrerequisiteChecker, REQUIRED_TOOLS};
pub use stage::{Stage, StageContext, StageResult, StageStatus};

use crate::cli::RuntimeConfig;
use crate::config::PipelineConfig;
use crate::error::{ReleaseError, Result};
use crate::layout::ProjectLayout;
use crate::metadata::ProjectManifest;
use crate::tools::Toolset;
use std::path::PathBuf;

/// What a successful run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Version embedded in the artifacts
    pub version: String,
    /// Identity used for every signature, if signing was enabled
    pub identity: Option<SigningIdentity>,
    /// Every stage in order with its status
    pub executed: Vec<(&'static str, StageStatus)>,
    /// Final artifacts
    pub artifacts: Vec<Artifact>,
    /// Mutating tool calls were suppressed
    pub dry_run: bool,
}

impl RunSummary {
    /// Status of a stage, if the run reached it
    pub fn status_of(&self, stage: &str) -> Option<StageStatus> {
        self.executed
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, status)| *status)
    }

    /// Whether `stage` executed successfully
    pub fn ran(&self, stage: &str) -> bool {
        self.status_of(stage) == Some(StageStatus::Ok)
    }

    /// Final artifact of `kind`
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Orchestrates one packaging run
pub struct Pipeline<'a> {
    config: PipelineConfig,
    manifest: ProjectManifest,
    layout: ProjectLayout,
    tools: Toolset,
    selector: Box<dyn IdentitySelector>,
    output: &'a RuntimeConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for the project at `root`
    pub fn new(
        config: PipelineConfig,
        manifest: ProjectManifest,
        root: impl Into<PathBuf>,
        tools: Toolset,
        selector: Box<dyn IdentitySelector>,
        output: &'a RuntimeConfig,
    ) -> Self {
        let layout = ProjectLayout::new(root, &manifest);
        Self {
            config,
            manifest,
            layout,
            tools,
            selector,
            output,
            stages: stages::default_stages(),
        }
    }

    /// Execute the pipeline
    pub fn run(&mut self) -> Result<RunSummary> {
        self.config.validate()?;
        PrerequisiteChecker::new(self.tools.probe.as_ref()).check(&self.config)?;

        let identity = if self.config.enable_signing {
            let identity = resolve_identity(
                self.tools.identities.as_ref(),
                self.selector.as_mut(),
                self.config.identity_hint.as_deref(),
            )?;
            self.output
                .info_println(&format!("Signing identity: {identity}"));
            Some(identity)
        } else {
            log::info!("Code signing disabled");
            None
        };

        let mut ctx = StageContext::new(
            &self.config,
            &self.manifest,
            &self.layout,
            &self.tools,
            self.output,
            identity.as_ref(),
        );
        let mut executed = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.name();
            if !stage.is_enabled(&ctx) {
                log::info!("Skipping stage {name}");
                let skipped = StageResult::skipped(name);
                executed.push((skipped.stage_name, skipped.status));
                continue;
            }

            log::info!("Running stage {name}");
            let result = StageResult::started(name);
            let outcome = stage.execute(&mut ctx);
            let result = result.finish(&outcome);
            executed.push((result.stage_name, result.status));

            if let Err(source) = outcome {
                log::debug!(
                    "Stage {} {}: {}",
                    result.stage_name,
                    result.status,
                    result.error_detail.unwrap_or_default()
                );
                return Err(ReleaseError::Stage {
                    stage: name,
                    source: Box::new(source),
                });
            }
            ctx.mark_completed(name);
        }

        let artifacts = ctx.artifacts.into_vec();
        Ok(RunSummary {
            version: self.config.version.clone(),
            identity,
            executed,
            artifacts,
            dry_run: self.config.dry_run,
        })
    }
}
