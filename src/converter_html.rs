//! HTML text extraction for files and http(s) URLs.
//!
//! Conversion runs a static extraction pass: fetch or read the document,
//! scope to the `<article>`/`<main>` element when one exists, drop chrome
//! elements (navigation, headers, footers, scripts, styles), and flatten the
//! remaining markup to plain text. Pages that only render content through
//! JavaScript yield nothing here and surface as a conversion error, which the
//! ingestion pipeline degrades through its raw-read fallback.

use std::time::Duration;

use async_trait::async_trait;

use crate::converter::{classify, validate_path, Converter, InputKind};
use crate::errors::{Error, Result, SecurityKind};

/// Elements whose entire subtree is discarded during extraction.
const SKIPPED_ELEMENTS: [&str; 9] = [
    "script", "style", "noscript", "head", "nav", "header", "footer", "aside", "template",
];

/// Elements that terminate a line of output text.
const BLOCK_ELEMENTS: [&str; 15] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "section",
    "article",
];

/// Timeout for fetching a remote page.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reader for `.html`/`.htm` files and http(s) URLs.
pub struct HtmlConverter {
    client: reqwest::Client,
}

impl HtmlConverter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn convert_url(&self, input: &str) -> Result<String> {
        let parsed = url::Url::parse(input).map_err(|e| Error::Conversion {
            input: input.to_string(),
            format: Some("html".to_string()),
            hint: Some("failed to parse URL".to_string()),
            source: Some(Box::new(e)),
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::Security {
                    kind: SecurityKind::UnsupportedScheme,
                    details: format!("unsupported URL scheme: {other}"),
                })
            }
        }

        let response = self
            .client
            .get(parsed)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Network {
                url: input.to_string(),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network {
                url: input.to_string(),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let html = response.text().await.map_err(|e| Error::Network {
            url: input.to_string(),
            status: None,
            source: Some(Box::new(e)),
        })?;

        self.finish(input, &html)
    }

    fn convert_file(&self, input: &str) -> Result<String> {
        validate_path(input)?;
        let bytes = std::fs::read(input)
            .map_err(|e| Error::storage("read file", Some(input.into()), e))?;
        self.finish(input, &String::from_utf8_lossy(&bytes))
    }

    fn finish(&self, input: &str, html: &str) -> Result<String> {
        let text = extract_article(html);
        if text.is_empty() {
            return Err(Error::Conversion {
                input: input.to_string(),
                format: Some("html".to_string()),
                hint: Some("page yielded no static content".to_string()),
                source: None,
            });
        }
        Ok(text)
    }
}

impl Default for HtmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Converter for HtmlConverter {
    fn supports(&self, input: &str) -> bool {
        let info = classify(input);
        match info.kind {
            InputKind::Url => true,
            InputKind::File => info.ext == ".html" || info.ext == ".htm",
            InputKind::Text => false,
        }
    }

    async fn convert(&self, input: &str) -> Result<String> {
        validate_path(input)?;
        match classify(input).kind {
            InputKind::Url => self.convert_url(input).await,
            _ => self.convert_file(input),
        }
    }
}

/// Extracts the readable text of an HTML document.
///
/// When the document contains an `<article>` or `<main>` element, extraction
/// is scoped to the first such region; otherwise the whole body is used.
pub fn extract_article(html: &str) -> String {
    let scoped = scope_to_content(html);
    flatten_text(scoped)
}

/// Narrows the document to its first `<article>` or `<main>` element.
fn scope_to_content(html: &str) -> &str {
    for name in ["article", "main"] {
        let open = format!("<{name}");
        let close = format!("</{name}");
        if let Some(start) = find_ci(html, &open) {
            let rest = &html[start..];
            if let Some(end) = find_ci(rest, &close) {
                return &rest[..end];
            }
            return rest;
        }
    }
    html
}

/// Case-insensitive (ASCII) substring search returning a byte offset.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| {
        h[i..i + n.len()]
            .iter()
            .zip(n)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}

/// Strips tags, skipping chrome subtrees and decoding common entities.
fn flatten_text(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if html[i..].starts_with("<!--") {
                i = match html[i..].find("-->") {
                    Some(end) => i + end + 3,
                    None => bytes.len(),
                };
                continue;
            }

            let tag_end = match html[i..].find('>') {
                Some(end) => i + end,
                None => break,
            };
            let tag = &html[i + 1..tag_end];
            let (closing, name) = parse_tag_name(tag);

            if !closing && SKIPPED_ELEMENTS.contains(&name.as_str()) {
                // Drop everything up to the matching close tag.
                let close = format!("</{name}");
                i = match find_ci(&html[tag_end..], &close) {
                    Some(pos) => {
                        let after = tag_end + pos;
                        match html[after..].find('>') {
                            Some(gt) => after + gt + 1,
                            None => bytes.len(),
                        }
                    }
                    None => bytes.len(),
                };
                continue;
            }

            if BLOCK_ELEMENTS.contains(&name.as_str()) {
                out.push('\n');
            }
            i = tag_end + 1;
        } else if bytes[i] == b'&' {
            let (decoded, consumed) = decode_entity(&html[i..]);
            out.push_str(decoded);
            i += consumed;
        } else {
            // Advance one UTF-8 character.
            let ch_len = html[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&html[i..i + ch_len]);
            i += ch_len;
        }
    }

    normalize_whitespace(&out)
}

fn parse_tag_name(tag: &str) -> (bool, String) {
    let tag = tag.trim_start();
    let (closing, tag) = match tag.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, tag),
    };
    let name: String = tag
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    (closing, name)
}

fn decode_entity(s: &str) -> (&'static str, usize) {
    const ENTITIES: [(&str, &str); 6] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
    ];
    for (entity, decoded) in ENTITIES {
        if s.len() >= entity.len()
            && s.as_bytes()[..entity.len()].eq_ignore_ascii_case(entity.as_bytes())
        {
            return (decoded, entity.len());
        }
    }
    ("&", 1)
}

fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_html_files_and_urls() {
        let converter = HtmlConverter::new();
        assert!(converter.supports("page.html"));
        assert!(converter.supports("page.HTM"));
        assert!(converter.supports("https://example.com/job"));
        assert!(!converter.supports("resume.pdf"));
        assert!(!converter.supports("raw text"));
    }

    #[test]
    fn extracts_body_text_and_decodes_entities() {
        let html = "<html><body><p>Senior Engineer &amp; Team Lead</p><p>Rust, Go</p></body></html>";
        assert_eq!(extract_article(html), "Senior Engineer & Team Lead\nRust, Go");
    }

    #[test]
    fn drops_scripts_styles_and_chrome() {
        let html = r#"<html><head><title>x</title><style>p{color:red}</style></head>
            <body><nav>Home | About</nav>
            <p>Job description body</p>
            <script>alert("hi")</script>
            <footer>Copyright</footer></body></html>"#;
        let text = extract_article(html);
        assert!(text.contains("Job description body"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("color:red"));
    }

    #[test]
    fn prefers_article_content() {
        let html = r#"<body><div>sidebar noise</div>
            <article><h1>Backend Developer</h1><p>5 years of Go required.</p></article>
            <div>more noise</div></body>"#;
        let text = extract_article(html);
        assert!(text.contains("Backend Developer"));
        assert!(text.contains("5 years of Go required."));
        assert!(!text.contains("sidebar noise"));
    }

    #[test]
    fn empty_page_extracts_to_empty() {
        assert_eq!(extract_article("<html><body></body></html>"), "");
        assert_eq!(extract_article(""), "");
    }

    #[test]
    fn comments_are_ignored() {
        let html = "<p>kept</p><!-- <p>commented out</p> -->";
        assert_eq!(extract_article(html), "kept");
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        // Scheme check happens inside convert_url; classification only
        // reaches it for http(s), so exercise the parser path directly.
        let converter = HtmlConverter::new();
        let err = converter.convert_url("ftp://example.com/x").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn empty_extraction_is_a_conversion_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.html");
        std::fs::write(&path, "<html><body><script>only()</script></body></html>").unwrap();

        let converter = HtmlConverter::new();
        let err = converter.convert(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }
}
