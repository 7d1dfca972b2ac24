//! Input classification and the document converter registry.
//!
//! An ingestion input is a URL, a local file path, or raw text; the registry
//! dispatches it to the first converter that supports it. Every converter
//! honors the same contract: bytes in, plain text out, with path-safety
//! validation before any filesystem access.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::{Error, Result, SecurityKind};

/// Extensions the pipeline recognises as file inputs. Formats without a
/// registered converter still classify as files so they reach the fallback
/// reader instead of being stored as literal text.
pub const SUPPORTED_EXTENSIONS: [&str; 9] = [
    ".pdf", ".html", ".htm", ".md", ".txt", ".docx", ".pptx", ".xlsx", ".doc",
];

/// How an ingestion input was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Url,
    File,
    Text,
}

/// Classification result: the input kind plus its lowercase extension
/// (including the dot; empty when none).
#[derive(Debug, Clone)]
pub struct InputInfo {
    pub kind: InputKind,
    pub ext: String,
}

/// Classifies an ingestion input.
///
/// URLs are anything starting with `http://` or `https://` that parses; a
/// malformed URL downgrades to text. A path counts as a file when it exists
/// on disk or carries a recognised extension (so missing files fail later
/// with a useful error instead of being ingested as text).
pub fn classify(input: &str) -> InputInfo {
    if input.starts_with("http://") || input.starts_with("https://") {
        if let Ok(parsed) = url::Url::parse(input) {
            let ext = extension_lower(parsed.path());
            return InputInfo {
                kind: InputKind::Url,
                ext,
            };
        }
        return InputInfo {
            kind: InputKind::Text,
            ext: String::new(),
        };
    }

    let ext = extension_lower(input);
    if Path::new(input).exists() || SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return InputInfo {
            kind: InputKind::File,
            ext,
        };
    }

    InputInfo {
        kind: InputKind::Text,
        ext: String::new(),
    }
}

fn extension_lower(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Rejects paths containing traversal sequences or NUL bytes.
pub fn validate_path(input: &str) -> Result<()> {
    if input.contains("..") {
        return Err(Error::Security {
            kind: SecurityKind::PathTraversal,
            details: format!("path contains traversal sequence: {input}"),
        });
    }
    if input.contains('\0') {
        return Err(Error::Security {
            kind: SecurityKind::NullByte,
            details: "path contains null bytes".to_string(),
        });
    }
    Ok(())
}

/// A format-specific reader converting an input to plain text.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Whether this converter can handle the input.
    fn supports(&self, input: &str) -> bool;

    /// Converts the input to plain text.
    async fn convert(&self, input: &str) -> Result<String>;
}

/// Ordered collection of converters; dispatch picks the first match.
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Registry with the built-in readers: PDF, HTML, then markdown/plain.
    /// The markdown reader goes last because it accepts any text input.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::converter_pdf::PdfConverter));
        registry.register(Box::new(crate::converter_html::HtmlConverter::new()));
        registry.register(Box::new(MarkdownConverter));
        registry
    }

    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    /// First converter whose `supports` accepts the input.
    pub fn find(&self, input: &str) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .find(|c| c.supports(input))
            .map(|c| c.as_ref())
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader for markdown and plain-text inputs.
///
/// Raw text passes through unchanged; `.md`/`.txt` files are read verbatim.
/// Idempotent by construction.
pub struct MarkdownConverter;

#[async_trait]
impl Converter for MarkdownConverter {
    fn supports(&self, input: &str) -> bool {
        let info = classify(input);
        match info.kind {
            InputKind::Text => true,
            InputKind::File => info.ext == ".md" || info.ext == ".txt",
            InputKind::Url => false,
        }
    }

    async fn convert(&self, input: &str) -> Result<String> {
        let info = classify(input);
        match info.kind {
            InputKind::Text => Ok(input.to_string()),
            _ => {
                validate_path(input)?;
                read_file_as_text(input)
            }
        }
    }
}

/// Reads a local file as UTF-8 text. I/O failures are storage errors
/// (retryable); the fallback path of the pipeline relies on that.
pub fn read_file_as_text(path: &str) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::storage("read file", Some(path.into()), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
