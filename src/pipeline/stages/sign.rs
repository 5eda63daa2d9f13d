use super::names;
use crate::error::Result;
use crate::pipeline::artifact::ArtifactKind;
use crate::pipeline::stage::{Stage, StageContext};
use crate::tools::SignOptions;
use plist::{Dictionary, Value};

/// Entitlements granted to the application, all set to true
pub const ENTITLEMENTS: &[&str] = &[
    "com.apple.security.cs.allow-unsigned-executable-memory",
    "com.apple.security.cs.allow-jit",
    "com.apple.security.network.client",
    "com.apple.security.files.user-selected.read-write",
];

/// The entitlements descriptor embedded in every signature of the bundle
pub fn entitlements_plist() -> Dictionary {
    ENTITLEMENTS
        .iter()
        .map(|key| (key.to_string(), Value::Boolean(true)))
        .collect()
}

/// Signs the inner binary, the launcher and then the bundle, and verifies
/// the result.
///
/// Nested code must be signed before its container, otherwise the bundle
/// signature seals stale nested signatures.
pub struct SignStage;

impl Stage for SignStage {
    fn name(&self) -> &'static str {
        names::SIGN
    }

    fn is_enabled(&self, ctx: &StageContext<'_>) -> bool {
        ctx.config.enable_signing
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let identity = ctx.signing_identity()?;
        let signer = &ctx.tools.signer;

        let entitlements = ctx.layout.entitlements_path();
        crate::utils::fs::create_dir_all(&ctx.layout.bundle_root())?;
        Value::Dictionary(entitlements_plist()).to_file_xml(&entitlements)?;
        log::debug!("Wrote entitlements to {}", entitlements.display());

        let nested = SignOptions {
            entitlements: Some(&entitlements),
            hardened_runtime: true,
            deep: false,
        };

        let mut binary = ctx.artifacts.take(ArtifactKind::Binary)?;
        let mut bundle = ctx.artifacts.take(ArtifactKind::Bundle)?;
        let launcher = ctx.layout.contents_dir().join("MacOS").join(ctx.layout.launcher_name());

        ctx.output
            .progress_println(&format!("Signing with '{}'...", identity));
        signer.sign(binary.path(), identity, nested)?;
        signer.sign(&launcher, identity, nested)?;
        signer.sign(
            bundle.path(),
            identity,
            SignOptions {
                deep: true,
                ..nested
            },
        )?;

        signer.verify(bundle.path())?;

        binary.signed = true;
        bundle.signed = true;
        ctx.artifacts.put(binary);
        ctx.artifacts.put(bundle);
        ctx.output.success_println("Bundle signed and verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entitlements_grant_exactly_four_capabilities() {
        let dict = entitlements_plist();
        assert_eq!(dict.len(), 4);
        assert!(
            dict.values()
                .all(|value| value.as_boolean() == Some(true))
        );
        assert!(dict.contains_key("com.apple.security.cs.allow-jit"));
    }
}
