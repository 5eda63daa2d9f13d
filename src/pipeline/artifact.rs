//! Files the pipeline produces and hands from stage to stage.

use crate::error::{ReleaseError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// What an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The application binary
    Binary,
    /// The `.app` directory
    Bundle,
    /// The compressed installer image
    DiskImage,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Binary => "binary",
            ArtifactKind::Bundle => "bundle",
            ArtifactKind::DiskImage => "disk image",
        })
    }
}

/// A typed path produced by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location on disk
    pub path: PathBuf,
    /// Artifact type
    pub kind: ArtifactKind,
    /// Set only after a signing stage succeeded on this exact artifact
    pub signed: bool,
}

impl Artifact {
    /// An unsigned artifact
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
            signed: false,
        }
    }

    /// Path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Artifacts currently held by the pipeline, one slot per kind.
///
/// A stage takes the artifacts it consumes out of the set and puts back
/// what it produced, so exactly one owner exists at any time.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    binary: Option<Artifact>,
    bundle: Option<Artifact>,
    image: Option<Artifact>,
}

impl ArtifactSet {
    fn slot(&mut self, kind: ArtifactKind) -> &mut Option<Artifact> {
        match kind {
            ArtifactKind::Binary => &mut self.binary,
            ArtifactKind::Bundle => &mut self.bundle,
            ArtifactKind::DiskImage => &mut self.image,
        }
    }

    /// Take ownership of an artifact produced by an earlier stage
    pub fn take(&mut self, kind: ArtifactKind) -> Result<Artifact> {
        self.slot(kind).take().ok_or_else(|| {
            ReleaseError::invalid_config(format!("no {kind} was produced by an earlier stage"))
        })
    }

    /// Hand an artifact to later stages, replacing any previous one
    pub fn put(&mut self, artifact: Artifact) {
        let kind = artifact.kind;
        *self.slot(kind) = Some(artifact);
    }

    /// Look at an artifact without taking it
    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        match kind {
            ArtifactKind::Binary => self.binary.as_ref(),
            ArtifactKind::Bundle => self.bundle.as_ref(),
            ArtifactKind::DiskImage => self.image.as_ref(),
        }
    }

    /// Whether the artifact of `kind` exists and is signed
    pub fn is_signed(&self, kind: ArtifactKind) -> bool {
        self.get(kind).is_some_and(|a| a.signed)
    }

    /// All remaining artifacts in production order
    pub fn into_vec(self) -> Vec<Artifact> {
        [self.binary, self.bundle, self.image]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_take_transfers_ownership() {
        let mut set = ArtifactSet::default();
        set.put(Artifact::new("/tmp/App.app", ArtifactKind::Bundle));

        let bundle = set.take(ArtifactKind::Bundle).unwrap();
        assert!(!bundle.signed);
        assert!(set.get(ArtifactKind::Bundle).is_none());

        let err = set.take(ArtifactKind::Bundle).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_into_vec_keeps_production_order() {
        let mut set = ArtifactSet::default();
        set.put(Artifact::new("App.dmg", ArtifactKind::DiskImage));
        set.put(Artifact::new("app", ArtifactKind::Binary));

        let kinds: Vec<_> = set.into_vec().into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, [ArtifactKind::Binary, ArtifactKind::DiskImage]);
    }

    #[test]
    fn test_put_replaces_previous_artifact() {
        let mut set = ArtifactSet::default();
        set.put(Artifact::new("target/release/app", ArtifactKind::Binary));

        let mut signed = Artifact::new("App.app/Contents/MacOS/app", ArtifactKind::Binary);
        signed.signed = true;
        set.put(signed);

        assert!(set.is_signed(ArtifactKind::Binary));
        assert_eq!(
            set.get(ArtifactKind::Binary).map(|a| a.path()),
            Some(std::path::Path::new("App.app/Contents/MacOS/app"))
        );
    }
}
