//! PDF text extraction.

use async_trait::async_trait;

use crate::converter::{classify, validate_path, Converter, InputKind};
use crate::errors::{Error, Result};

/// Reader for `.pdf` files. Extraction is pure Rust (`pdf-extract`), page
/// texts are concatenated with blank-line separators, and an empty but valid
/// PDF yields an empty string rather than an error.
pub struct PdfConverter;

#[async_trait]
impl Converter for PdfConverter {
    fn supports(&self, input: &str) -> bool {
        let info = classify(input);
        info.kind == InputKind::File && info.ext == ".pdf"
    }

    async fn convert(&self, input: &str) -> Result<String> {
        validate_path(input)?;
        let bytes = std::fs::read(input)
            .map_err(|e| Error::storage("read file", Some(input.into()), e))?;
        extract_text(&bytes).map_err(|e| Error::Conversion {
            input: input.to_string(),
            format: Some("pdf".to_string()),
            hint: Some("failed to extract text from PDF".to_string()),
            source: Some(e.to_string().into()),
        })
    }
}

/// Extracts the concatenated plain text of all pages.
pub fn extract_text(bytes: &[u8]) -> std::result::Result<String, pdf_extract::OutputError> {
    pdf_extract::extract_text_from_mem(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_only_pdf_files() {
        assert!(PdfConverter.supports("resume.pdf"));
        assert!(PdfConverter.supports("dir/Resume.PDF"));
        assert!(!PdfConverter.supports("resume.md"));
        assert!(!PdfConverter.supports("plain text content"));
        assert!(!PdfConverter.supports("https://example.com/resume.pdf"));
    }

    #[tokio::test]
    async fn invalid_bytes_are_a_conversion_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = PdfConverter.convert(path.to_str().unwrap()).await.unwrap_err();
        match &err {
            Error::Conversion { format, .. } => assert_eq!(format.as_deref(), Some("pdf")),
            other => panic!("expected Conversion, got {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn missing_file_is_a_storage_error() {
        let err = PdfConverter.convert("nowhere/missing.pdf").await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn traversal_is_rejected_before_io() {
        let err = PdfConverter.convert("../secret.pdf").await.unwrap_err();
        assert!(matches!(err, Error::Security { .. }));
    }
}
