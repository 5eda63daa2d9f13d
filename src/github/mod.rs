//! GitHub integration for release operations

mod release_manager;

pub use release_manager::{
    API_BASE, GitHubReleaseHost, GitHubRepo, UPLOAD_BASE, detect_content_type,
};
