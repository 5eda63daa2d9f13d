//! # dmg_release
//!
//! Turns a compiled Rust desktop application into a trusted, distributable
//! macOS disk image.
//!
//! ## Pipeline
//!
//! `Build → Bundle → [Sign] → Package → [SignImage] → [Notarize]`
//!
//! - **Build**: `cargo build --release`
//! - **Bundle**: `.app` layout with `Info.plist`, launcher and icon
//! - **Sign**: binary, launcher and bundle with hardened runtime, then strict verification
//! - **Package**: UDZO disk image with an `/Applications` link
//! - **SignImage**: signature on the image itself
//! - **Notarize**: notary submission and stapling
//!
//! Optional stages are controlled by `ENABLE_CODESIGN`, `CODESIGN_IDENTITY`,
//! `ENABLE_NOTARIZE` and `NOTARY_PROFILE`. A separate `publish` command
//! creates a draft GitHub release for the finished image.
//!
//! ## Usage
//!
//! ```bash
//! dmg_release                 # unsigned image
//! ENABLE_CODESIGN=true dmg_release
//! dmg_release --dry-run       # show what would run
//! dmg_release publish         # draft release with the image attached
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod publish;
pub mod tools;
pub mod utils;

pub use cli::Args;
pub use config::{EnvConfig, PipelineConfig};
pub use error::{ErrorKind, ReleaseError, Result};
pub use layout::ProjectLayout;
pub use metadata::ProjectManifest;
pub use pipeline::{Pipeline, RunSummary};
pub use publish::ReleasePublisher;
pub use tools::Toolset;
