//! Error types for release pipeline operations.
//!
//! Every failure belongs to one of five kinds (see [`ErrorKind`]). Stage
//! failures are wrapped with the failing stage's name so the operator sees
//! which step broke together with the tool's verbatim output.

use std::{
    fmt::{self, Display},
    io,
    path::PathBuf,
};
use thiserror::Error;

/// Result type alias for dmg_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all dmg_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// One or more required tools or inputs are absent
    #[error("Missing prerequisites: {}", .missing.join(", "))]
    PrerequisiteMissing {
        /// Everything that was found missing, reported at once
        missing: Vec<String>,
    },

    /// Configuration values are inconsistent or malformed
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for the error
        reason: String,
    },

    /// An external tool exited unsuccessfully
    #[error("{tool} failed:\n{output}")]
    ExternalToolFailure {
        /// Tool command line
        tool: String,
        /// Raw diagnostic text produced by the tool
        output: String,
    },

    /// Signature verification rejected an artifact
    #[error("Signature verification failed for {path}:\n{output}")]
    VerificationFailure {
        /// Verified artifact
        path: PathBuf,
        /// Raw verifier output
        output: String,
    },

    /// A release tag is already taken
    #[error("Release tag '{tag}' already exists")]
    UniquenessViolation {
        /// Tag name
        tag: String,
    },

    /// A pipeline stage failed
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        /// Stage name
        stage: &'static str,
        /// Underlying failure
        #[source]
        source: Box<ReleaseError>,
    },

    /// File system error with path context.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation being performed (e.g. "creating bundle directory")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Property list errors
    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Release notes template errors
    #[error("Template error: {0}")]
    Template(String),

    /// Git repository errors
    #[error("Git error: {0}")]
    Git(String),
}

/// Classification of a [`ReleaseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required tool or input absent
    PrerequisiteMissing,
    /// Bad or inconsistent configuration
    InvalidConfiguration,
    /// Non-zero exit from an invoked tool
    ExternalToolFailure,
    /// Signature verification rejected an artifact
    VerificationFailure,
    /// Release tag collision
    UniquenessViolation,
    /// File system or I/O failure
    Io,
    /// Anything else (parsing, transport)
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PrerequisiteMissing => "PrerequisiteMissing",
            ErrorKind::InvalidConfiguration => "InvalidConfiguration",
            ErrorKind::ExternalToolFailure => "ExternalToolFailure",
            ErrorKind::VerificationFailure => "VerificationFailure",
            ErrorKind::UniquenessViolation => "UniquenessViolation",
            ErrorKind::Io => "Io",
            ErrorKind::Other => "Other",
        };
        f.write_str(name)
    }
}

impl From<handlebars::RenderError> for ReleaseError {
    fn from(error: handlebars::RenderError) -> Self {
        ReleaseError::Template(error.to_string())
    }
}

impl From<handlebars::TemplateError> for ReleaseError {
    fn from(error: handlebars::TemplateError) -> Self {
        ReleaseError::Template(error.to_string())
    }
}

impl ReleaseError {
    /// Shorthand for [`ReleaseError::InvalidConfiguration`]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ReleaseError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Classify this error, looking through stage wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::PrerequisiteMissing { .. } => ErrorKind::PrerequisiteMissing,
            ReleaseError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            ReleaseError::ExternalToolFailure { .. } => ErrorKind::ExternalToolFailure,
            ReleaseError::VerificationFailure { .. } => ErrorKind::VerificationFailure,
            ReleaseError::UniquenessViolation { .. } => ErrorKind::UniquenessViolation,
            ReleaseError::Stage { source, .. } => source.kind(),
            ReleaseError::Fs { .. } | ReleaseError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Other,
        }
    }

    /// Name of the stage that failed, if the error came from one
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            ReleaseError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Stage { source, .. } => source.recovery_suggestions(),
            ReleaseError::PrerequisiteMissing { .. } => vec![
                "Install the Xcode Command Line Tools: xcode-select --install".to_string(),
                "Install the Rust toolchain: https://rustup.rs".to_string(),
                "List signing identities: security find-identity -v -p codesigning".to_string(),
            ],
            ReleaseError::InvalidConfiguration { .. } => vec![
                "ENABLE_NOTARIZE=true requires ENABLE_CODESIGN=true".to_string(),
                "Check CODESIGN_IDENTITY against: security find-identity -v -p codesigning"
                    .to_string(),
            ],
            ReleaseError::VerificationFailure { path, .. } => vec![
                format!("Inspect the signature: codesign -dvvv '{}'", path.display()),
                "Make sure nested code was signed before the bundle".to_string(),
            ],
            ReleaseError::UniquenessViolation { tag } => vec![
                "Bump the version in Cargo.toml before publishing again".to_string(),
                format!("Or delete the existing tag: git tag -d {tag}"),
            ],
            ReleaseError::ExternalToolFailure { .. } => vec![
                "Read the tool output above; the pipeline can be re-run safely".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Trait for adding context to errors.
///
/// Works with both `Result<T>` and `Option<T>`; a `None` becomes an
/// [`ReleaseError::InvalidConfiguration`] carrying the context text.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| ReleaseError::invalid_config(context.to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| ReleaseError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
