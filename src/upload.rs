//! Uploaded-file handling: errors, filename sanitizing, and saving.

use std::path::{Path, PathBuf};

/// Why an upload did not produce a usable document.
///
/// The `Display` text is what the user sees in the upload response.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only PDF files are accepted.")]
    InvalidType,
    #[error("No readable content in PDF.")]
    EmptyContent,
    /// Extraction failed; the detail is logged, not shown.
    #[error("No readable content in PDF.")]
    Unreadable(String),
    #[error("Upload failed: {0}")]
    Io(String),
}

/// Name used when sanitizing leaves nothing behind.
const FALLBACK_NAME: &str = "upload.pdf";

/// Reduces a client-supplied filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; whitespace and path
/// separators become `_`; everything else is dropped. Leading dots and
/// underscores are stripped so the result can't be hidden or relative.
pub fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() || c == '/' || c == '\\' => Some('_'),
            _ => None,
        })
        .collect();

    let trimmed = mapped.trim_start_matches(&['.', '_'][..]).trim_end_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes `bytes` into `dir` under the sanitized `filename`.
pub async fn save_upload(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| UploadError::Io(e.to_string()))?;
    let path = dir.join(sanitize_filename(filename));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| UploadError::Io(e.to_string()))?;
    Ok(path)
}
