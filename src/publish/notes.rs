//! Release notes rendered from a fixed template.

use crate::error::{ErrorExt, Result};
use handlebars::Handlebars;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Markdown body of every draft release
pub const NOTES_TEMPLATE: &str = "\
## {{app_name}} {{version}}

Released {{date}}.

### Install

1. Download `{{file_name}}`.
2. Open the disk image and drag **{{app_name}}** onto the Applications folder.

### Checksum

| File | Size | SHA-256 |
|------|------|---------|
| `{{file_name}}` | {{size}} | `{{sha256}}` |
";

/// Values substituted into [`NOTES_TEMPLATE`]
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseNotes {
    /// Application display name
    pub app_name: String,
    /// Released version
    pub version: String,
    /// Image file name
    pub file_name: String,
    /// Human readable image size
    pub size: String,
    /// Hex SHA-256 of the image
    pub sha256: String,
    /// Release date, `YYYY-MM-DD`
    pub date: String,
}

impl ReleaseNotes {
    /// Collect the values for the image at `image`
    pub fn for_image(app_name: &str, version: &str, image: &Path) -> Result<Self> {
        let bytes = std::fs::metadata(image)
            .fs_context("reading image metadata", image)?
            .len();
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            file_name,
            size: format_size(bytes),
            sha256: sha256_file(image)?,
            date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        })
    }

    /// Render the notes
    pub fn render(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        Ok(handlebars.render_template(NOTES_TEMPLATE, self)?)
    }
}

/// Calculate SHA-256 checksum of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).fs_context("opening file for checksum", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .fs_context("reading file for checksum", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.2} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
