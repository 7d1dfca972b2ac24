//! Error taxonomy for the document pipeline.
//!
//! Every fallible operation in the crate returns [`Error`]. The variants map
//! one-to-one onto the failure classes the protocol surface distinguishes:
//! validation and security failures are reported with a field citation and
//! never retried, storage and network failures are transient and flow through
//! the retry harness, conversion failures are deterministic and fall back to
//! the raw reader instead of retrying.

use std::path::PathBuf;

use thiserror::Error;

/// The specific security violation detected during input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityKind {
    /// Path contains a `..` traversal sequence.
    PathTraversal,
    /// Path contains a NUL byte.
    NullByte,
    /// URL scheme outside the http/https allow-list.
    UnsupportedScheme,
}

impl std::fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SecurityKind::PathTraversal => "path_traversal",
            SecurityKind::NullByte => "null_byte",
            SecurityKind::UnsupportedScheme => "unsupported_scheme",
        };
        f.write_str(s)
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation. Cites the offending field.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Input violated a security rule (traversal, NUL byte, bad scheme).
    #[error("security violation ({kind}): {details}")]
    Security { kind: SecurityKind, details: String },

    /// A document URI did not resolve to a stored file.
    #[error("document not found: {uri}")]
    NotFound { uri: String },

    /// Document conversion failed. Deterministic; not retried by default.
    #[error("conversion failed for {input}{}{}", fmt_opt(.format, " (format: ", ")"), fmt_opt(.hint, "\nHint: ", ""))]
    Conversion {
        input: String,
        format: Option<String>,
        hint: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage I/O failure. Typically transient (locks, permissions, disk).
    #[error("storage error during {operation}{}", fmt_path(.path))]
    Storage {
        operation: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Network failure while fetching a remote resource.
    #[error("network error accessing {url}{}", fmt_status(.status))]
    Network {
        url: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A retried operation exhausted its attempt budget.
    #[error("operation failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// The surrounding request was cancelled while waiting to retry.
    #[error("operation cancelled")]
    Cancelled,

    /// Anything that should not leak detail to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

fn fmt_opt(value: &Option<String>, prefix: &str, suffix: &str) -> String {
    match value {
        Some(v) => format!("{prefix}{v}{suffix}"),
        None => String::new(),
    }
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" (path: {})", p.display()),
        None => String::new(),
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (status: {s})"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for a validation failure citing a field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a storage failure wrapping an I/O error.
    pub fn storage(
        operation: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Storage {
            operation: operation.into(),
            path,
            source: Some(source),
        }
    }

    /// Whether the retry harness may re-attempt the failed operation.
    ///
    /// Storage I/O is always retryable. Network failures are retryable on
    /// 5xx or when no status was observed (timeout, refused connection).
    /// Everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage { .. } => true,
            Error::Network { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            Error::RetriesExhausted { source, .. } => source.is_retryable(),
            Error::Validation { .. }
            | Error::Security { .. }
            | Error::NotFound { .. }
            | Error::Conversion { .. }
            | Error::Cancelled
            | Error::Internal(_) => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
