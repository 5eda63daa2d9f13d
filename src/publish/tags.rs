use super::TagRegistry;
use crate::error::{ReleaseError, Result};
use std::path::PathBuf;

/// Tags of the local git repository containing the project
#[derive(Debug, Clone)]
pub struct GitTagRegistry {
    path: PathBuf,
}

impl GitTagRegistry {
    /// Registry for the repository discovered from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TagRegistry for GitTagRegistry {
    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        let path = self.path.clone();
        let reference = format!("refs/tags/{tag}");

        // gix is blocking
        tokio::task::spawn_blocking(move || {
            let repo = gix::discover(&path).map_err(|e| {
                ReleaseError::Git(format!("no git repository at {}: {e}", path.display()))
            })?;
            let found = repo
                .try_find_reference(reference.as_str())
                .map_err(|e| ReleaseError::Git(format!("looking up {reference}: {e}")))?;
            Ok(found.is_some())
        })
        .await
        .map_err(|e| ReleaseError::Git(format!("Task join error: {e}")))?
    }
}
