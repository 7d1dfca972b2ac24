//! Document ingestion pipeline.
//!
//! Validates the input, acquires its plain-text form through the converter
//! registry (with bounded retries and a raw-read fallback), and saves the
//! result to the content-addressed store. A fallback that succeeds where the
//! primary converter failed is reported as a degraded but successful
//! outcome, never as an error.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::converter::{classify, validate_path, ConverterRegistry, InputKind};
use crate::errors::{Error, Result};
use crate::retry::{retry, RetryPolicy, Sleeper, TokioSleeper};
use crate::storage::{DocumentKind, DocumentStore};
use tokio_util::sync::CancellationToken;

/// Record of a fallback taken during ingestion.
#[derive(Debug, Clone)]
pub struct Degradation {
    pub component: String,
    pub fallback: String,
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "degraded operation in {} (using fallback: {})",
            self.component, self.fallback
        )
    }
}

/// Successful ingestion: the stored document's URI, plus a degradation note
/// when the primary converter was bypassed.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub uri: String,
    pub degraded: Option<Degradation>,
}

/// The ingestion pipeline. Stateless per request; safe to share.
pub struct Ingestor {
    store: Arc<DocumentStore>,
    converters: Arc<ConverterRegistry>,
    sleeper: Arc<dyn Sleeper>,
}

impl Ingestor {
    pub fn new(store: Arc<DocumentStore>, converters: Arc<ConverterRegistry>) -> Self {
        Self {
            store,
            converters,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Substitutes the retry sleeper (tests use a no-wait fake).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Ingests a document from a local path, URL, or raw text, and returns
    /// its storage URI. Cancelling `cancel` aborts any retry backoff in
    /// progress.
    pub async fn ingest(
        &self,
        input: &str,
        doc_type: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome> {
        let kind = DocumentKind::parse(doc_type)
            .ok_or_else(|| Error::validation("type", "must be 'cv' or 'jd'"))?;

        validate_path(input)?;

        let original_filename = derive_filename(input);
        let (text, degraded) = self.acquire_text(input, cancel).await?;

        let uri = retry(
            &RetryPolicy::storage(),
            self.sleeper.as_ref(),
            cancel,
            |_| async { self.store.save(kind, text.as_bytes(), &original_filename) },
        )
        .await?;

        if let Some(d) = &degraded {
            tracing::warn!(uri = %uri, component = %d.component, fallback = %d.fallback, "document ingested degraded");
        } else {
            tracing::info!(uri = %uri, doc_type = %kind, "document ingested");
        }

        Ok(IngestOutcome { uri, degraded })
    }

    /// Converts the input to text.
    ///
    /// File and URL inputs go through the first supporting converter under
    /// the conversion retry policy; when that fails, the bytes are re-read as
    /// plain text and the outcome marked degraded. Raw text is its own
    /// content.
    async fn acquire_text(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<Degradation>)> {
        match classify(input).kind {
            InputKind::Text => Ok((input.to_string(), None)),
            InputKind::File | InputKind::Url => match self.converters.find(input) {
                Some(converter) => {
                    let converted = retry(
                        &RetryPolicy::conversion(),
                        self.sleeper.as_ref(),
                        cancel,
                        |_| converter.convert(input),
                    )
                    .await;

                    match converted {
                        Ok(text) => Ok((text, None)),
                        // A cancelled request aborts outright; the fallback
                        // is for conversion failures only.
                        Err(Error::Cancelled) => Err(Error::Cancelled),
                        Err(primary) => match self.read_raw(input, cancel).await {
                            Ok(text) => {
                                tracing::warn!(input, error = %primary, "conversion failed, fell back to raw read");
                                Ok((
                                    text,
                                    Some(Degradation {
                                        component: "converter".to_string(),
                                        fallback: "read as markdown".to_string(),
                                    }),
                                ))
                            }
                            Err(_) => Err(Error::Conversion {
                                input: input.to_string(),
                                format: None,
                                hint: Some("direct file read also failed".to_string()),
                                source: Some(Box::new(primary)),
                            }),
                        },
                    }
                }
                None => self
                    .read_raw(input, cancel)
                    .await
                    .map(|text| (text, None))
                    .map_err(|e| Error::Conversion {
                        input: input.to_string(),
                        format: None,
                        hint: Some("no converter available and direct read failed".to_string()),
                        source: Some(Box::new(e)),
                    }),
            },
        }
    }

    /// Raw-read fallback: the file's bytes treated as text, under retry.
    async fn read_raw(&self, input: &str, cancel: &CancellationToken) -> Result<String> {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        retry(&policy, self.sleeper.as_ref(), cancel, |_| async {
            crate::converter::read_file_as_text(input)
        })
        .await
    }
}

/// Original filename for the frontmatter: the basename of a path or URL,
/// `document.md` for raw text or when no basename exists.
fn derive_filename(input: &str) -> String {
    const DEFAULT: &str = "document.md";
    match classify(input).kind {
        InputKind::Text => DEFAULT.to_string(),
        InputKind::Url => url::Url::parse(input)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT.to_string()),
        InputKind::File => Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT.to_string()),
    }
}
