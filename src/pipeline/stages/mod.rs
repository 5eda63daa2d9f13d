//! The six pipeline stages, in execution order.

mod build;
mod bundle;
mod notarize;
mod package;
mod sign;
mod sign_image;

pub use build::BuildStage;
pub use bundle::{BundleStage, info_plist, launcher_script};
pub use notarize::NotarizeStage;
pub use package::PackageStage;
pub use sign::{ENTITLEMENTS, SignStage, entitlements_plist};
pub use sign_image::SignImageStage;

use super::stage::Stage;

/// Stage names as they appear in logs and the run summary
pub mod names {
    /// Compile the release binary
    pub const BUILD: &str = "Build";
    /// Assemble the `.app` bundle
    pub const BUNDLE: &str = "Bundle";
    /// Sign binary, launcher and bundle
    pub const SIGN: &str = "Sign";
    /// Create the disk image
    pub const PACKAGE: &str = "Package";
    /// Sign the disk image
    pub const SIGN_IMAGE: &str = "SignImage";
    /// Notarize and staple the disk image
    pub const NOTARIZE: &str = "Notarize";
}

/// `Build → Bundle → [Sign] → Package → [SignImage] → [Notarize]`
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(BuildStage),
        Box::new(BundleStage),
        Box::new(SignStage),
        Box::new(PackageStage),
        Box::new(SignImageStage),
        Box::new(NotarizeStage),
    ]
}
