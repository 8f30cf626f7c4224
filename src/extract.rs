//! PDF text extraction for uploaded documents.
//!
//! Upload handling supplies the raw bytes; this module returns plain UTF-8
//! text or an [`ExtractError`]. It never panics on malformed input.

/// Extension accepted by the upload endpoint (compared case-insensitively).
pub const PDF_EXTENSION: &str = ".pdf";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Whether `filename` names a document type we can extract.
pub fn is_supported_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(PDF_EXTENSION)
}

/// Extracts the text of every page, concatenated in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on some malformed inputs; keep that inside the
    // extraction boundary.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked on malformed input".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_supported_filename("report.pdf"));
        assert!(is_supported_filename("REPORT.PDF"));
        assert!(!is_supported_filename("report.txt"));
        assert!(!is_supported_filename("report.pdf.exe"));
        assert!(!is_supported_filename("pdf"));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
