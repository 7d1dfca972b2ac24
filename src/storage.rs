//! Content-addressed document store.
//!
//! Documents are stored as flat files under `<root>/<kind>/` with the
//! lowercase hex SHA-256 of their body as the file stem. Saving the same
//! bytes twice therefore resolves to the same file and the same URI, and
//! enumeration is always a directory read; the store keeps no in-memory
//! index.
//!
//! Each stored file starts with a YAML-style frontmatter block recording the
//! id, original filename, ingestion timestamp, and document kind. The body
//! after the closing `---` delimiter is bytewise the content the caller
//! supplied.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{Error, Result};
use crate::filesystem::FileSystem;

/// The two kinds of stored document. The kind is part of both the URI scheme
/// and the on-disk path, so IDs can never collide across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Cv,
    Jd,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Cv, DocumentKind::Jd];

    /// Sub-directory name and URI scheme (`cv` / `jd`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::Jd => "jd",
        }
    }

    pub fn parse(s: &str) -> Option<DocumentKind> {
        match s {
            "cv" => Some(DocumentKind::Cv),
            "jd" => Some(DocumentKind::Jd),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `cv://<id>` or `jd://<id>` URI into its kind and ID.
///
/// The first five characters must be one of the two schemes and the ID must
/// be non-empty; anything else is a validation failure.
pub fn parse_uri(uri: &str) -> Result<(DocumentKind, &str)> {
    let kind = match uri.get(..5) {
        Some("cv://") => DocumentKind::Cv,
        Some("jd://") => DocumentKind::Jd,
        _ => {
            return Err(Error::validation(
                "uri",
                format!("unsupported URI scheme: {uri}"),
            ))
        }
    };
    let id = &uri[5..];
    if id.is_empty() {
        return Err(Error::validation("uri", format!("URI has empty ID: {uri}")));
    }
    Ok((kind, id))
}

/// Formats a storage URI from a kind and document ID.
pub fn format_uri(kind: DocumentKind, id: &str) -> String {
    format!("{}://{}", kind.as_str(), id)
}

/// Computes the content-addressed document ID: lowercase hex SHA-256.
pub fn generate_id(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Removes the leading frontmatter block from stored file content.
///
/// Returns the body exactly as saved (no trimming), or the input unchanged
/// when no well-formed frontmatter is present.
pub fn strip_frontmatter(content: &str) -> &str {
    if let Some(rest) = content.strip_prefix("---\n") {
        if let Some(pos) = rest.find("\n---\n") {
            return &rest[pos + 5..];
        }
    }
    content
}

/// Content-addressed document store over a [`FileSystem`] port.
pub struct DocumentStore {
    root: PathBuf,
    default_ttl: Duration,
    fs: Arc<dyn FileSystem>,
}

impl DocumentStore {
    /// Creates the store and its `<root>/cv` and `<root>/jd` directories.
    ///
    /// Failure to create either directory is a hard error; the store is
    /// unusable without them.
    pub fn new(
        root: impl Into<PathBuf>,
        default_ttl: Duration,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let root = root.into();
        for kind in DocumentKind::ALL {
            let dir = root.join(kind.as_str());
            fs.mkdir_all(&dir)
                .map_err(|e| Error::storage("init - create directory", Some(dir.clone()), e))?;
        }
        tracing::info!(
            root = %root.display(),
            default_ttl_secs = default_ttl.as_secs(),
            "document store initialized"
        );
        Ok(Self {
            root,
            default_ttl,
            fs,
        })
    }

    /// Directory holding all documents of the given kind.
    pub fn kind_dir(&self, kind: DocumentKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Saves a document and returns its URI.
    ///
    /// The ID is the SHA-256 of `body`. When a file for that ID already
    /// exists the write is skipped and the existing URI returned, so saving
    /// identical content is idempotent.
    pub fn save(
        &self,
        kind: DocumentKind,
        body: &[u8],
        original_filename: &str,
    ) -> Result<String> {
        let id = generate_id(body);
        let ext = extension_of(original_filename).unwrap_or_else(|| ".md".to_string());
        let path = self.kind_dir(kind).join(format!("{id}{ext}"));

        if self.fs.stat(&path).is_ok() {
            tracing::debug!(kind = %kind, id = %id, "document already exists, deduplicated");
            return Ok(format_uri(kind, &id));
        }

        let frontmatter = format!(
            "---\nid: {id}\noriginal_filename: {original_filename}\ningested_at: {}\ntype: {kind}\n---\n",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        );
        let mut content = frontmatter.into_bytes();
        content.extend_from_slice(body);

        self.fs
            .write_file(&path, &content)
            .map_err(|e| Error::storage("save document", Some(path.clone()), e))?;

        tracing::info!(kind = %kind, id = %id, filename = original_filename, "document saved");
        Ok(format_uri(kind, &id))
    }

    /// Resolves a URI to the path of its backing file.
    ///
    /// Scans the kind directory for an entry whose file stem equals the ID
    /// exactly; a bare prefix match is never accepted.
    pub fn document_path(&self, uri: &str) -> Result<PathBuf> {
        let (kind, id) = parse_uri(uri)?;
        let dir = self.kind_dir(kind);
        let entries = self
            .fs
            .read_dir(&dir)
            .map_err(|e| Error::storage("read directory", Some(dir.clone()), e))?;

        for entry in entries {
            if entry.is_dir {
                continue;
            }
            if Path::new(&entry.name).file_stem().and_then(|s| s.to_str()) == Some(id) {
                return Ok(dir.join(&entry.name));
            }
        }
        Err(Error::NotFound {
            uri: uri.to_string(),
        })
    }

    /// Reads the full stored file (frontmatter included).
    pub fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.document_path(uri)?;
        self.fs
            .read_file(&path)
            .map_err(|e| Error::storage("read document", Some(path), e))
    }

    /// Reads the document body with the frontmatter stripped.
    pub fn read_body(&self, uri: &str) -> Result<String> {
        let raw = self.read(uri)?;
        let text = String::from_utf8_lossy(&raw).into_owned();
        Ok(strip_frontmatter(&text).to_string())
    }

    /// Whether the URI resolves to a stored document. Never fails.
    pub fn exists(&self, uri: &str) -> bool {
        self.document_path(uri).is_ok()
    }

    /// Lists all stored document IDs, one vector per kind.
    pub fn list_all(&self) -> Result<(Vec<String>, Vec<String>)> {
        let mut cv_ids = Vec::new();
        let mut jd_ids = Vec::new();
        for kind in DocumentKind::ALL {
            let dir = self.kind_dir(kind);
            let entries = self
                .fs
                .read_dir(&dir)
                .map_err(|e| Error::storage("list documents", Some(dir.clone()), e))?;
            for entry in entries {
                if entry.is_dir {
                    continue;
                }
                let Some(stem) = Path::new(&entry.name).file_stem().and_then(|s| s.to_str())
                else {
                    continue;
                };
                match kind {
                    DocumentKind::Cv => cv_ids.push(stem.to_string()),
                    DocumentKind::Jd => jd_ids.push(stem.to_string()),
                }
            }
        }
        Ok((cv_ids, jd_ids))
    }

    /// Counts stored documents per kind.
    pub fn stats(&self) -> Result<(usize, usize)> {
        let (cv, jd) = self.list_all()?;
        Ok((cv.len(), jd.len()))
    }

    /// Removes documents whose last modification is older than `ttl`.
    ///
    /// A zero TTL selects the store default. Errors on individual files are
    /// logged and skipped so one bad entry cannot halt the sweep. Returns the
    /// number of files removed.
    pub fn cleanup(&self, ttl: Duration) -> Result<u64> {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let cutoff = SystemTime::now()
            .checked_sub(ttl)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0u64;

        for kind in DocumentKind::ALL {
            let dir = self.kind_dir(kind);
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "cleanup: cannot read directory");
                    continue;
                }
            };
            for entry in entries {
                if entry.is_dir || entry.modified >= cutoff {
                    continue;
                }
                let path = dir.join(&entry.name);
                match self.fs.remove(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "cleanup: remove failed");
                    }
                }
            }
        }

        tracing::info!(removed, ttl_secs = ttl.as_secs(), "storage cleanup completed");
        Ok(removed)
    }

    /// Whether the root and both kind directories currently exist.
    ///
    /// Used by the readiness probe.
    pub fn is_accessible(&self) -> bool {
        if self.fs.stat(&self.root).is_err() {
            return false;
        }
        DocumentKind::ALL
            .iter()
            .all(|kind| self.fs.stat(&self.kind_dir(*kind)).is_ok())
    }
}

/// Extension of a filename including the dot, or `None` when absent.
fn extension_of(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemFileSystem;

    fn mem_store() -> (Arc<MemFileSystem>, DocumentStore) {
        let fs = Arc::new(MemFileSystem::new());
        let store = DocumentStore::new(
            "storage",
            Duration::from_secs(24 * 3600),
            fs.clone() as Arc<dyn FileSystem>,
        )
        .unwrap();
        (fs, store)
    }

    #[test]
    fn parse_uri_accepts_both_schemes() {
        assert_eq!(parse_uri("cv://abc").unwrap(), (DocumentKind::Cv, "abc"));
        assert_eq!(parse_uri("jd://abc").unwrap(), (DocumentKind::Jd, "abc"));
    }

    #[test]
    fn parse_uri_rejects_bad_input() {
        assert!(parse_uri("cv://").is_err());
        assert!(parse_uri("file://x").is_err());
        assert!(parse_uri("cv:/abc").is_err());
        assert!(parse_uri("").is_err());
    }

    #[test]
    fn save_is_deduplicated_by_content() {
        let (fs, store) = mem_store();
        let u1 = store.save(DocumentKind::Cv, b"hello", "a.md").unwrap();
        let u2 = store.save(DocumentKind::Cv, b"hello", "b.md").unwrap();
        assert_eq!(u1, u2);

        let entries = fs.read_dir(Path::new("storage/cv")).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_read_round_trip_preserves_body() {
        let (_fs, store) = mem_store();
        let body = "# CV\n\nName: Ada Lovelace\n";
        let uri = store.save(DocumentKind::Cv, body.as_bytes(), "ada.md").unwrap();

        let raw = String::from_utf8(store.read(&uri).unwrap()).unwrap();
        assert!(raw.starts_with("---\n"));
        assert!(raw.contains("original_filename: ada.md"));
        assert!(raw.contains("type: cv"));

        assert_eq!(store.read_body(&uri).unwrap(), body);
    }

    #[test]
    fn extension_is_preserved_and_defaults_to_md() {
        let (fs, store) = mem_store();
        let uri = store.save(DocumentKind::Jd, b"pdf bytes", "role.pdf").unwrap();
        let (_, id) = parse_uri(&uri).unwrap();
        assert!(fs.stat(Path::new(&format!("storage/jd/{id}.pdf"))).is_ok());

        let uri2 = store.save(DocumentKind::Jd, b"plain", "noext").unwrap();
        let (_, id2) = parse_uri(&uri2).unwrap();
        assert!(fs.stat(Path::new(&format!("storage/jd/{id2}.md"))).is_ok());
    }

    #[test]
    fn read_unknown_id_is_not_found() {
        let (_fs, store) = mem_store();
        let err = store.read("cv://deadbeef").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!store.exists("cv://deadbeef"));
    }

    #[test]
    fn ids_do_not_collide_across_kinds() {
        let (_fs, store) = mem_store();
        let cv = store.save(DocumentKind::Cv, b"same body", "a.md").unwrap();
        let jd = store.save(DocumentKind::Jd, b"same body", "a.md").unwrap();
        assert_ne!(cv, jd);
        assert!(store.exists(&cv));
        assert!(store.exists(&jd));
    }

    #[test]
    fn list_and_stats_count_per_kind() {
        let (_fs, store) = mem_store();
        store.save(DocumentKind::Cv, b"one", "a.md").unwrap();
        store.save(DocumentKind::Cv, b"two", "b.md").unwrap();
        store.save(DocumentKind::Jd, b"three", "c.md").unwrap();

        let (cv_ids, jd_ids) = store.list_all().unwrap();
        assert_eq!(cv_ids.len(), 2);
        assert_eq!(jd_ids.len(), 1);
        assert_eq!(store.stats().unwrap(), (2, 1));
    }

    #[test]
    fn cleanup_removes_only_stale_files() {
        let (fs, store) = mem_store();
        let uri = store.save(DocumentKind::Cv, b"old", "a.md").unwrap();
        store.save(DocumentKind::Cv, b"fresh", "b.md").unwrap();

        let path = store.document_path(&uri).unwrap();
        fs.set_modified(&path, SystemTime::now() - Duration::from_secs(48 * 3600));

        let removed = store.cleanup(Duration::from_secs(24 * 3600)).unwrap();
        assert_eq!(removed, 1);
        assert!(!store.exists(&uri));

        // Second sweep has nothing left to remove.
        let removed = store.cleanup(Duration::from_secs(24 * 3600)).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.stats().unwrap(), (1, 0));
    }

    #[test]
    fn cleanup_with_longer_ttl_removes_no_more() {
        let (fs, store) = mem_store();
        let uri = store.save(DocumentKind::Cv, b"old", "a.md").unwrap();
        let path = store.document_path(&uri).unwrap();
        fs.set_modified(&path, SystemTime::now() - Duration::from_secs(30 * 3600));

        // 48h TTL keeps what a 24h TTL would remove.
        assert_eq!(store.cleanup(Duration::from_secs(48 * 3600)).unwrap(), 0);
        assert_eq!(store.cleanup(Duration::from_secs(24 * 3600)).unwrap(), 1);
    }

    #[test]
    fn is_accessible_tracks_directories() {
        let (fs, store) = mem_store();
        assert!(store.is_accessible());
        fs.remove_all(Path::new("storage/jd")).unwrap();
        assert!(!store.is_accessible());
    }

    #[test]
    fn strip_frontmatter_is_exact() {
        let body = "line one\nline two\n";
        let content = format!("---\nid: x\ntype: cv\n---\n{body}");
        assert_eq!(strip_frontmatter(&content), body);
        // No frontmatter: unchanged.
        assert_eq!(strip_frontmatter(body), body);
        // Unclosed frontmatter: unchanged.
        assert_eq!(strip_frontmatter("---\nid: x\n"), "---\nid: x\n");
    }
}
