//! End-to-end pipeline runs against in-memory tools.

use dmg_release::cli::RuntimeConfig;
use dmg_release::config::{DEFAULT_NOTARY_PROFILE, PipelineConfig};
use dmg_release::error::{ErrorKind, Result};
use dmg_release::pipeline::stages::names;
use dmg_release::pipeline::{
    ArtifactKind, IdentityKind, IdentitySelector, Pipeline, PresetSelector, RunSummary,
    SigningIdentity, StageStatus,
};
use dmg_release::tools::{
    Compiler, IconConverter, IdentityStore, ImageBuilder, NotaryVerdict, Notarizer, SignOptions,
    Signer, ToolProbe, Toolset,
};
use dmg_release::ProjectManifest;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

type Log = Rc<RefCell<Vec<String>>>;

struct FakeProbe {
    missing: Vec<&'static str>,
}

impl ToolProbe for FakeProbe {
    fn is_available(&self, tool: &str) -> bool {
        !self.missing.contains(&tool)
    }
}

struct FakeCompiler {
    log: Log,
    writes_binary: bool,
}

impl Compiler for FakeCompiler {
    fn build_release(&self, project_root: &Path, binary: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("build {binary}"));
        if !self.writes_binary {
            return Ok(());
        }
        let release = project_root.join("target/release");
        std::fs::create_dir_all(&release)?;
        std::fs::write(release.join(binary), b"\xCF\xFA\xED\xFE fake binary")?;
        Ok(())
    }
}

struct FakeIcons {
    log: Log,
}

impl IconConverter for FakeIcons {
    fn convert(&self, _iconset: &Path, output: &Path) -> Result<()> {
        self.log.borrow_mut().push("iconutil".to_string());
        std::fs::write(output, b"icns")?;
        Ok(())
    }
}

struct FakeSigner {
    log: Log,
    verify_ok: bool,
}

impl Signer for FakeSigner {
    fn sign(&self, path: &Path, identity: &SigningIdentity, options: SignOptions<'_>) -> Result<()> {
        let name = path.file_name().unwrap().to_string_lossy();
        self.log.borrow_mut().push(format!(
            "sign {name} as {} entitlements={} deep={}",
            identity.signing_reference(),
            options.entitlements.is_some(),
            options.deep
        ));
        Ok(())
    }

    fn verify(&self, path: &Path) -> Result<()> {
        self.log.borrow_mut().push("verify".to_string());
        if self.verify_ok {
            Ok(())
        } else {
            Err(dmg_release::ReleaseError::VerificationFailure {
                path: path.to_path_buf(),
                output: "code object is not signed at all".to_string(),
            })
        }
    }
}

struct FakeImages {
    log: Log,
    staging: Rc<RefCell<Option<PathBuf>>>,
    fails: bool,
}

impl ImageBuilder for FakeImages {
    fn create(&self, volume_name: &str, source_dir: &Path, output: &Path) -> Result<()> {
        assert!(source_dir.join("App.app/Contents/Info.plist").is_file());
        assert!(
            std::fs::symlink_metadata(source_dir.join("Applications"))
                .unwrap()
                .file_type()
                .is_symlink()
        );
        *self.staging.borrow_mut() = Some(source_dir.to_path_buf());
        self.log.borrow_mut().push(format!("hdiutil {volume_name}"));
        if self.fails {
            return Err(dmg_release::ReleaseError::ExternalToolFailure {
                tool: "hdiutil create".to_string(),
                output: "hdiutil: create failed - No space left on device".to_string(),
            });
        }
        std::fs::write(output, b"udzo")?;
        Ok(())
    }
}

struct FakeNotary {
    log: Log,
    verdict: NotaryVerdict,
}

impl Notarizer for FakeNotary {
    fn submit(&self, artifact: &Path, profile: &str) -> Result<NotaryVerdict> {
        let name = artifact.file_name().unwrap().to_string_lossy();
        self.log
            .borrow_mut()
            .push(format!("notarize {name} {profile}"));
        Ok(self.verdict.clone())
    }

    fn staple(&self, _artifact: &Path) -> Result<()> {
        self.log.borrow_mut().push("staple".to_string());
        Ok(())
    }
}

struct FakeStore {
    log: Log,
    identities: Vec<SigningIdentity>,
}

impl IdentityStore for FakeStore {
    fn find_identities(&self) -> Result<Vec<SigningIdentity>> {
        self.log.borrow_mut().push("find-identity".to_string());
        Ok(self.identities.clone())
    }
}

/// Fails the test if the pipeline ever prompts
struct NoPrompt;

impl IdentitySelector for NoPrompt {
    fn select(&mut self, _candidates: &[SigningIdentity]) -> Result<usize> {
        panic!("identity selection must not prompt");
    }
}

fn identity(name: &str, fingerprint: &str) -> SigningIdentity {
    SigningIdentity {
        display_name: name.to_string(),
        kind: IdentityKind::from_display_name(name),
        trusted: true,
        fingerprint: Some(fingerprint.to_string()),
    }
}

struct Harness {
    dir: TempDir,
    log: Log,
    staging: Rc<RefCell<Option<PathBuf>>>,
    identities: Vec<SigningIdentity>,
    verdict: NotaryVerdict,
    verify_ok: bool,
    missing_tools: Vec<&'static str>,
    compiler_writes_binary: bool,
    image_fails: bool,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            include_str!("fixtures/Cargo.toml"),
        )
        .unwrap();
        Self {
            dir,
            log: Rc::default(),
            staging: Rc::default(),
            identities: Vec::new(),
            verdict: NotaryVerdict::Accepted,
            verify_ok: true,
            missing_tools: Vec::new(),
            compiler_writes_binary: true,
            image_fails: false,
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn with_iconset(self) -> Self {
        let iconset = self.root().join("assets/icon.iconset");
        std::fs::create_dir_all(&iconset).unwrap();
        std::fs::write(iconset.join("icon_512x512.png"), b"png").unwrap();
        self
    }

    fn toolset(&self) -> Toolset {
        Toolset {
            probe: Box::new(FakeProbe {
                missing: self.missing_tools.clone(),
            }),
            compiler: Box::new(FakeCompiler {
                log: self.log.clone(),
                writes_binary: self.compiler_writes_binary,
            }),
            icons: Box::new(FakeIcons {
                log: self.log.clone(),
            }),
            signer: Box::new(FakeSigner {
                log: self.log.clone(),
                verify_ok: self.verify_ok,
            }),
            images: Box::new(FakeImages {
                log: self.log.clone(),
                staging: self.staging.clone(),
                fails: self.image_fails,
            }),
            notarizer: Box::new(FakeNotary {
                log: self.log.clone(),
                verdict: self.verdict.clone(),
            }),
            identities: Box::new(FakeStore {
                log: self.log.clone(),
                identities: self.identities.clone(),
            }),
        }
    }

    fn run(&self, config: PipelineConfig, selector: Box<dyn IdentitySelector>) -> Result<RunSummary> {
        let output = RuntimeConfig::quiet();
        let manifest = ProjectManifest::load(self.root())?;
        let mut pipeline = Pipeline::new(
            config,
            manifest,
            self.root(),
            self.toolset(),
            selector,
            &output,
        );
        pipeline.run()
    }

    fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

fn config(sign: bool, notarize: bool) -> PipelineConfig {
    PipelineConfig {
        version: "1.2.0".to_string(),
        enable_signing: sign,
        enable_notarization: notarize,
        identity_hint: None,
        notary_profile: DEFAULT_NOTARY_PROFILE.to_string(),
        dry_run: false,
    }
}

const FIRST: &str = "1111111111111111111111111111111111111111";
const SECOND: &str = "2222222222222222222222222222222222222222";

#[test]
fn test_unsigned_run_produces_unsigned_image() {
    let harness = Harness::new();
    let summary = harness.run(config(false, false), Box::new(NoPrompt)).unwrap();

    let image = summary.artifact(ArtifactKind::DiskImage).unwrap();
    assert_eq!(image.path.file_name().unwrap(), "App-1.2.0.dmg");
    assert!(image.path.is_file());
    assert!(!image.signed);
    assert!(summary.artifacts.iter().all(|a| !a.signed));

    assert!(harness.calls_starting_with("sign").is_empty());
    assert!(harness.calls_starting_with("verify").is_empty());
    assert!(harness.calls_starting_with("find-identity").is_empty());

    assert_eq!(summary.status_of(names::SIGN), Some(StageStatus::Skipped));
    assert_eq!(summary.status_of(names::SIGN_IMAGE), Some(StageStatus::Skipped));
    assert_eq!(summary.status_of(names::NOTARIZE), Some(StageStatus::Skipped));
    assert!(summary.ran(names::PACKAGE));
    assert!(summary.identity.is_none());
    assert!(!harness.root().join("target/release/bundle/entitlements.plist").exists());
}

#[test]
fn test_bundle_layout() {
    let harness = Harness::new().with_iconset();
    harness.run(config(false, false), Box::new(NoPrompt)).unwrap();

    let contents = harness.root().join("target/release/bundle/macos/App.app/Contents");
    assert!(contents.join("MacOS/dj-uploader").is_file());
    assert!(contents.join("Resources/App.icns").is_file());
    assert_eq!(std::fs::read(contents.join("PkgInfo")).unwrap(), b"APPL????");

    let launcher = contents.join("MacOS/dj-uploader-launcher");
    let script = std::fs::read_to_string(&launcher).unwrap();
    assert!(script.contains("exec \"$DIR/dj-uploader\" --gui"));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&launcher).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    let info = plist::Value::from_file(contents.join("Info.plist")).unwrap();
    let info = info.as_dictionary().unwrap();
    assert_eq!(
        info.get("CFBundleIdentifier").and_then(|v| v.as_string()),
        Some("com.weekendsuperhero.dj-uploader")
    );
    assert_eq!(
        info.get("CFBundleVersion").and_then(|v| v.as_string()),
        Some("1.2.0")
    );
    assert_eq!(
        info.get("CFBundleIconFile").and_then(|v| v.as_string()),
        Some("App.icns")
    );
}

#[test]
fn test_missing_iconset_is_not_fatal() {
    let harness = Harness::new();
    harness.run(config(false, false), Box::new(NoPrompt)).unwrap();

    assert!(harness.calls_starting_with("iconutil").is_empty());
    let info = plist::Value::from_file(
        harness
            .root()
            .join("target/release/bundle/macos/App.app/Contents/Info.plist"),
    )
    .unwrap();
    assert!(info.as_dictionary().unwrap().get("CFBundleIconFile").is_none());
}

#[test]
fn test_notarize_without_signing_fails_before_build() {
    let harness = Harness::new();
    let err = harness
        .run(config(false, true), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert!(harness.calls().is_empty());
}

#[test]
fn test_missing_tools_are_reported_together() {
    let mut harness = Harness::new();
    harness.missing_tools = vec!["hdiutil", "codesign"];
    let err = harness
        .run(config(false, false), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PrerequisiteMissing);
    let message = err.to_string();
    assert!(message.contains("hdiutil") && message.contains("codesign"));
    assert!(harness.calls().is_empty());
}

#[test]
fn test_zero_developer_id_identities_stops_before_stages() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Apple Development: dev@example.com (AAAA)", FIRST)];
    let err = harness
        .run(config(true, false), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PrerequisiteMissing);
    assert_eq!(harness.calls(), ["find-identity"]);
}

#[test]
fn test_single_identity_is_used_without_prompt() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Developer ID Application: Only (TEAM1)", FIRST)];
    let summary = harness.run(config(true, false), Box::new(NoPrompt)).unwrap();

    let signs = harness.calls_starting_with("sign");
    assert_eq!(signs.len(), 4);
    assert!(signs.iter().all(|s| s.contains(FIRST)));
    assert!(summary.artifact(ArtifactKind::DiskImage).unwrap().signed);
    assert!(summary.artifact(ArtifactKind::Bundle).unwrap().signed);
    assert!(harness.root().join("target/release/bundle/entitlements.plist").is_file());
}

#[test]
fn test_second_of_two_identities_signs_everything() {
    let mut harness = Harness::new();
    harness.identities = vec![
        identity("Developer ID Application: First (TEAM1)", FIRST),
        identity("Developer ID Application: Second (TEAM2)", SECOND),
    ];
    let summary = harness
        .run(config(true, false), Box::new(PresetSelector::new(2)))
        .unwrap();

    assert_eq!(
        summary.identity.as_ref().map(|i| i.display_name.as_str()),
        Some("Developer ID Application: Second (TEAM2)")
    );
    assert_eq!(
        harness.calls_starting_with("sign"),
        [
            format!("sign dj-uploader as {SECOND} entitlements=true deep=false"),
            format!("sign dj-uploader-launcher as {SECOND} entitlements=true deep=false"),
            format!("sign App.app as {SECOND} entitlements=true deep=true"),
            format!("sign App-1.2.0.dmg as {SECOND} entitlements=false deep=false"),
        ]
    );

    // Verification sits between the bundle and the image
    let calls = harness.calls();
    let verify = calls.iter().position(|c| c == "verify").unwrap();
    let hdiutil = calls.iter().position(|c| c.starts_with("hdiutil")).unwrap();
    assert!(verify < hdiutil);
    assert_eq!(summary.status_of(names::NOTARIZE), Some(StageStatus::Skipped));
}

#[test]
fn test_identity_hint_selects_matching_identity() {
    let mut harness = Harness::new();
    harness.identities = vec![
        identity("Developer ID Application: First (TEAM1)", FIRST),
        identity("Developer ID Application: Second (TEAM2)", SECOND),
    ];
    let mut config = config(true, false);
    config.identity_hint = Some("TEAM2".to_string());

    harness.run(config, Box::new(NoPrompt)).unwrap();
    assert!(
        harness
            .calls_starting_with("sign")
            .iter()
            .all(|s| s.contains(SECOND))
    );
}

#[test]
fn test_verification_failure_stops_before_packaging() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Developer ID Application: Only (TEAM1)", FIRST)];
    harness.verify_ok = false;
    let err = harness
        .run(config(true, false), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VerificationFailure);
    assert_eq!(err.stage(), Some(names::SIGN));
    assert!(harness.calls_starting_with("hdiutil").is_empty());
}

#[test]
fn test_accepted_notarization_is_stapled() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Developer ID Application: Only (TEAM1)", FIRST)];
    let summary = harness.run(config(true, true), Box::new(NoPrompt)).unwrap();

    let calls = harness.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        [
            format!("notarize App-1.2.0.dmg {DEFAULT_NOTARY_PROFILE}"),
            "staple".to_string(),
        ]
    );
    assert!(summary.ran(names::NOTARIZE));
}

#[test]
fn test_rejected_notarization_is_not_stapled() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Developer ID Application: Only (TEAM1)", FIRST)];
    harness.verdict = NotaryVerdict::Rejected("status: Invalid".to_string());
    let err = harness
        .run(config(true, true), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
    assert_eq!(err.stage(), Some(names::NOTARIZE));
    assert!(err.to_string().contains("status: Invalid"));
    assert!(harness.calls_starting_with("staple").is_empty());
    // Partial output stays on disk
    assert!(
        harness
            .root()
            .join("target/release/bundle/dmg/App-1.2.0.dmg")
            .is_file()
    );
}

#[test]
fn test_rerun_recreates_outputs() {
    let mut harness = Harness::new();
    harness.identities = vec![identity("Developer ID Application: Only (TEAM1)", FIRST)];

    harness.run(config(true, false), Box::new(NoPrompt)).unwrap();
    let stale = harness
        .root()
        .join("target/release/bundle/macos/App.app/Contents/Resources/stale.txt");
    std::fs::write(&stale, b"left over").unwrap();

    let summary = harness.run(config(true, false), Box::new(NoPrompt)).unwrap();
    assert!(summary.artifact(ArtifactKind::DiskImage).unwrap().signed);
    assert!(!stale.exists());
    assert_eq!(harness.calls_starting_with("build").len(), 2);
}

#[test]
fn test_staging_directory_is_removed() {
    let harness = Harness::new();
    harness.run(config(false, false), Box::new(NoPrompt)).unwrap();

    let staging = harness.staging.borrow().clone().unwrap();
    assert!(staging.starts_with(harness.root().join("target/release/bundle")));
    assert!(!staging.exists());
}

#[test]
fn test_staging_directory_is_removed_when_imaging_fails() {
    let mut harness = Harness::new();
    harness.image_fails = true;
    let err = harness
        .run(config(false, false), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
    assert_eq!(err.stage(), Some(names::PACKAGE));
    let staging = harness.staging.borrow().clone().unwrap();
    assert!(!staging.exists());
}

#[test]
fn test_dry_run_tolerates_missing_binary() {
    let mut harness = Harness::new();
    harness.compiler_writes_binary = false;
    let mut dry = config(false, false);
    dry.dry_run = true;

    let summary = harness.run(dry, Box::new(NoPrompt)).unwrap();
    assert_eq!(summary.status_of(names::BUILD), Some(StageStatus::Ok));
    assert_eq!(summary.status_of(names::BUNDLE), Some(StageStatus::Ok));
    assert!(summary.dry_run);

    let macos = harness.root().join("target/release/bundle/macos/App.app/Contents/MacOS");
    assert!(!macos.join("dj-uploader").exists());
    assert!(macos.join("dj-uploader-launcher").is_file());
}

#[test]
fn test_missing_binary_fails_build_outside_dry_run() {
    let mut harness = Harness::new();
    harness.compiler_writes_binary = false;
    let err = harness
        .run(config(false, false), Box::new(NoPrompt))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PrerequisiteMissing);
    assert_eq!(err.stage(), Some(names::BUILD));
    assert!(harness.calls_starting_with("hdiutil").is_empty());
}
