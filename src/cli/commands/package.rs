//! The default command: run the packaging pipeline.

use super::project_version;
use crate::cli::{Args, RuntimeConfig};
use crate::config::{EnvConfig, PipelineConfig};
use crate::error::Result;
use crate::metadata::ProjectManifest;
use crate::pipeline::stages::names;
use crate::pipeline::{ArtifactKind, Pipeline, RunSummary, StageStatus, TerminalSelector};
use crate::tools::Toolset;

/// Run the pipeline for the project in the current directory
pub fn execute_package(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let root = std::env::current_dir()?;
    let manifest = ProjectManifest::load(&root)?;

    let version = project_version(&manifest, config);

    let env = EnvConfig::from_process();
    let pipeline_config = PipelineConfig::from_env(&env, version, args.dry_run)?;

    config.section(&format!("Packaging {} {}", manifest.app_name(), pipeline_config.version));
    if args.dry_run {
        config.info_println("Dry run: mutating tool calls will be skipped");
    }

    let tools = Toolset::system(args.dry_run);
    let mut pipeline = Pipeline::new(
        pipeline_config,
        manifest,
        root,
        tools,
        Box::new(TerminalSelector::stdio()),
        config,
    );
    let summary = pipeline.run()?;

    print_summary(config, &summary);
    Ok(0)
}

/// Report which stages ran and where the artifacts are
pub fn print_summary(config: &RuntimeConfig, summary: &RunSummary) {
    config.section("Summary");
    config.println(&format!("Version: {}", summary.version));

    for (stage, status) in &summary.executed {
        let marker = match status {
            StageStatus::Ok => "✓",
            StageStatus::Skipped => "-",
            StageStatus::Failed => "✗",
        };
        config.indent(&format!("{marker} {stage} ({status})"));
    }

    if let Some(identity) = &summary.identity {
        config.println(&format!("Signed with: {identity}"));
    }

    if let Some(image) = summary.artifact(ArtifactKind::DiskImage) {
        let state = if summary.ran(names::NOTARIZE) {
            "signed, notarized"
        } else if image.signed {
            "signed, not notarized"
        } else {
            "unsigned"
        };
        config.success_println(&format!("Disk image: {} ({state})", image.path.display()));
    }

    if summary.dry_run {
        config.warning_println("Dry run: no external tool changed anything");
    }
}
