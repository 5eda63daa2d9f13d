//! The shared stage capability and the per-run context stages work in.

use super::artifact::{ArtifactKind, ArtifactSet};
use super::identity::SigningIdentity;
use crate::cli::RuntimeConfig;
use crate::config::PipelineConfig;
use crate::error::{ReleaseError, Result};
use crate::layout::ProjectLayout;
use crate::metadata::ProjectManifest;
use crate::tools::Toolset;
use std::fmt;

/// Outcome of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Completed successfully
    Ok,
    /// Aborted the run
    Failed,
    /// Not enabled for this run
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageStatus::Ok => "ok",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        })
    }
}

/// Result record for one stage; consumed by the orchestrator, never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Stage name
    pub stage_name: &'static str,
    /// Final status
    pub status: StageStatus,
    /// Failure text, only for [`StageStatus::Failed`]
    pub error_detail: Option<String>,
}

impl StageResult {
    /// Record for a stage that has just been entered
    pub fn started(stage_name: &'static str) -> Self {
        Self {
            stage_name,
            status: StageStatus::Ok,
            error_detail: None,
        }
    }

    /// Record for a stage that was not enabled
    pub fn skipped(stage_name: &'static str) -> Self {
        Self {
            status: StageStatus::Skipped,
            ..Self::started(stage_name)
        }
    }

    /// Finalize from the stage's return value
    pub fn finish(mut self, outcome: &Result<()>) -> Self {
        if let Err(e) = outcome {
            self.status = StageStatus::Failed;
            self.error_detail = Some(e.to_string());
        }
        self
    }
}

/// Everything a stage may read or hand on during one run
pub struct StageContext<'a> {
    /// Run configuration
    pub config: &'a PipelineConfig,
    /// Project descriptor
    pub manifest: &'a ProjectManifest,
    /// Conventional paths
    pub layout: &'a ProjectLayout,
    /// External tools
    pub tools: &'a Toolset,
    /// User-facing output
    pub output: &'a RuntimeConfig,
    /// Resolved identity; present exactly when signing is enabled
    pub identity: Option<&'a SigningIdentity>,
    /// Artifacts produced so far
    pub artifacts: ArtifactSet,
    completed: Vec<&'static str>,
}

impl<'a> StageContext<'a> {
    /// Context for a fresh run
    pub fn new(
        config: &'a PipelineConfig,
        manifest: &'a ProjectManifest,
        layout: &'a ProjectLayout,
        tools: &'a Toolset,
        output: &'a RuntimeConfig,
        identity: Option<&'a SigningIdentity>,
    ) -> Self {
        Self {
            config,
            manifest,
            layout,
            tools,
            output,
            identity,
            artifacts: ArtifactSet::default(),
            completed: Vec::new(),
        }
    }

    /// The identity signing stages must use
    pub fn signing_identity(&self) -> Result<&'a SigningIdentity> {
        self.identity
            .ok_or_else(|| ReleaseError::invalid_config("signing requested without an identity"))
    }

    /// Whether `stage` completed earlier in this run
    pub fn has_completed(&self, stage: &str) -> bool {
        self.completed.contains(&stage)
    }

    /// Whether the artifact of `kind` is currently signed
    pub fn is_signed(&self, kind: ArtifactKind) -> bool {
        self.artifacts.is_signed(kind)
    }

    pub(crate) fn mark_completed(&mut self, stage: &'static str) {
        self.completed.push(stage);
    }
}

/// One unit of pipeline work
pub trait Stage {
    /// Display name used in logs, errors and the run summary
    fn name(&self) -> &'static str;

    /// Whether the stage runs, given the configuration and what ran before it
    fn is_enabled(&self, ctx: &StageContext<'_>) -> bool;

    /// Do the work, taking input artifacts from and putting outputs into the context
    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()>;
}
