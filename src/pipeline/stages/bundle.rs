//! Application bundle assembly.
//!
//! ```text
//! <AppName>.app/Contents/
//!   Info.plist
//!   PkgInfo
//!   MacOS/<bin>
//!   MacOS/<bin>-launcher
//!   Resources/<AppName>.icns
//! ```

use super::names;
use crate::error::{ErrorExt, Result};
use crate::layout::ProjectLayout;
use crate::metadata::ProjectManifest;
use crate::pipeline::artifact::{Artifact, ArtifactKind};
use crate::pipeline::stage::{Stage, StageContext};
use crate::utils::fs;
use plist::{Dictionary, Value};
use std::path::Path;

/// Builds the `.app` directory from the release binary
pub struct BundleStage;

/// Shell launcher that starts the binary in its single supported mode.
///
/// Arguments given to the launcher are deliberately not forwarded.
pub fn launcher_script(binary_name: &str, launch_argument: &str) -> String {
    format!(
        "#!/bin/sh\n\
         DIR=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\n\
         exec \"$DIR/{binary_name}\" {launch_argument}\n"
    )
}

/// Contents of `Info.plist`
pub fn info_plist(
    manifest: &ProjectManifest,
    layout: &ProjectLayout,
    version: &str,
    icon_file: Option<&str>,
) -> Dictionary {
    let bundle = &manifest.bundle;
    let mut dict = Dictionary::new();

    dict.insert("CFBundleDevelopmentRegion".into(), "English".into());
    dict.insert("CFBundleDisplayName".into(), layout.app_name().into());
    dict.insert("CFBundleExecutable".into(), layout.launcher_name().into());
    dict.insert("CFBundleIdentifier".into(), manifest.identifier().into());
    dict.insert("CFBundleName".into(), layout.app_name().into());
    dict.insert("CFBundlePackageType".into(), "APPL".into());
    dict.insert("CFBundleShortVersionString".into(), version.into());
    dict.insert("CFBundleVersion".into(), version.into());
    dict.insert("CFBundleInfoDictionaryVersion".into(), "6.0".into());
    dict.insert(
        "LSMinimumSystemVersion".into(),
        bundle.minimum_system_version.clone().into(),
    );
    dict.insert("NSHighResolutionCapable".into(), true.into());

    if let Some(icon) = icon_file {
        dict.insert("CFBundleIconFile".into(), icon.into());
    }
    if let Some(category) = &bundle.category {
        dict.insert("LSApplicationCategoryType".into(), category.clone().into());
    }
    if let Some(copyright) = &bundle.copyright {
        dict.insert("NSHumanReadableCopyright".into(), copyright.clone().into());
    }

    if !bundle.document_types.is_empty() {
        let types = bundle
            .document_types
            .iter()
            .map(|doc| {
                let mut entry = Dictionary::new();
                entry.insert("CFBundleTypeName".into(), doc.name.clone().into());
                entry.insert("CFBundleTypeRole".into(), doc.role.clone().into());
                entry.insert(
                    "CFBundleTypeExtensions".into(),
                    Value::Array(doc.extensions.iter().map(|e| e.clone().into()).collect()),
                );
                Value::Dictionary(entry)
            })
            .collect();
        dict.insert("CFBundleDocumentTypes".into(), Value::Array(types));
    }

    dict
}

impl BundleStage {
    fn copy_binary(ctx: &StageContext<'_>, source: &Path, dest: &Path) -> Result<bool> {
        if !source.is_file() {
            // Only reachable in dry-run; Build fails otherwise
            ctx.output.warning_println(&format!(
                "Release binary {} not found, bundle will not contain it",
                source.display()
            ));
            return Ok(false);
        }
        std::fs::copy(source, dest).fs_context("copying binary into bundle", dest)?;
        fs::set_executable(dest)?;
        Ok(true)
    }

    fn create_icon(ctx: &StageContext<'_>, resources_dir: &Path) -> Result<Option<String>> {
        let iconset = ctx.layout.iconset_dir();
        if !iconset.is_dir() {
            ctx.output.warning_println(&format!(
                "Iconset {} not found, bundle will use the generic icon",
                iconset.display()
            ));
            return Ok(None);
        }

        let icon_name = ctx.layout.icon_file_name();
        ctx.tools
            .icons
            .convert(iconset, &resources_dir.join(&icon_name))?;
        Ok(Some(icon_name))
    }
}

impl Stage for BundleStage {
    fn name(&self) -> &'static str {
        names::BUNDLE
    }

    fn is_enabled(&self, _ctx: &StageContext<'_>) -> bool {
        true
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let layout = ctx.layout;
        let binary = ctx.artifacts.take(ArtifactKind::Binary)?;
        let bundle_path = layout.bundle_path();

        log::info!("Bundling {} at {}", layout.app_name(), bundle_path.display());
        fs::remove_path(&bundle_path)?;

        let contents_dir = layout.contents_dir();
        let macos_dir = contents_dir.join("MacOS");
        let resources_dir = contents_dir.join("Resources");
        fs::create_dir_all(&macos_dir)?;
        fs::create_dir_all(&resources_dir)?;

        let bundled_binary = macos_dir.join(layout.binary_name());
        let copied = Self::copy_binary(ctx, binary.path(), &bundled_binary)?;

        let launcher = macos_dir.join(layout.launcher_name());
        let script = launcher_script(layout.binary_name(), &ctx.manifest.bundle.launch_argument);
        fs::write_executable(&launcher, script.as_bytes())?;

        let icon = Self::create_icon(ctx, &resources_dir)?;

        let plist_path = contents_dir.join("Info.plist");
        let info = info_plist(ctx.manifest, layout, &ctx.config.version, icon.as_deref());
        Value::Dictionary(info).to_file_xml(&plist_path)?;

        let pkg_info = contents_dir.join("PkgInfo");
        std::fs::write(&pkg_info, b"APPL????").fs_context("writing PkgInfo", &pkg_info)?;

        if copied {
            ctx.artifacts
                .put(Artifact::new(bundled_binary, ArtifactKind::Binary));
        } else {
            ctx.artifacts.put(binary);
        }
        ctx.artifacts
            .put(Artifact::new(bundle_path.clone(), ArtifactKind::Bundle));
        ctx.output
            .success_println(&format!("Created {}", bundle_path.display()));
        Ok(())
    }
}
