//! MCP tool implementations.
//!
//! Each tool validates its own arguments, cites the offending field on
//! failure, and returns human-readable text. The registry is built once at
//! server startup and shared across sessions behind an `Arc`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::analyze::{AnalysisEngine, AnalysisResult};
use crate::config::parse_ttl_arg;
use crate::errors::{Error, Result};
use crate::ingest::Ingestor;
use crate::prompts::{build_interview_questions_prompt, InterviewStyle};
use crate::storage::{parse_uri, DocumentKind, DocumentStore};
use tokio_util::sync::CancellationToken;

/// Shared dependencies handed to every tool invocation.
pub struct ToolContext {
    pub store: Arc<DocumentStore>,
    pub ingestor: Arc<Ingestor>,
    pub engine: Arc<AnalysisEngine>,
}

/// A named MCP tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed over MCP (lowercase with underscores).
    fn name(&self) -> &str;

    /// One-line description for tool discovery.
    fn description(&self) -> &str;

    /// JSON Schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Executes the tool, returning the text content of the result.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String>;
}

/// Registry of tools exposed by the server.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with the five built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(IngestDocumentTool));
        registry.register(Box::new(ListDocumentsTool));
        registry.register(Box::new(CleanupStorageTool));
        registry.register(Box::new(AnalyzeTool));
        registry.register(Box::new(InterviewQuestionsTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    match params.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::validation(field, "required parameter missing")),
    }
}

/// Parses and existence-checks a document URI argument of the expected kind.
fn validate_doc_uri(
    store: &DocumentStore,
    field: &str,
    uri: &str,
    expected: DocumentKind,
) -> Result<()> {
    let (kind, _) = parse_uri(uri)
        .map_err(|_| Error::validation(field, format!("must be {}:// format", expected)))?;
    if kind != expected {
        return Err(Error::validation(
            field,
            format!("must be {}:// format", expected),
        ));
    }
    if !store.exists(uri) {
        return Err(Error::validation(field, format!("document not found: {uri}")));
    }
    Ok(())
}

// ── ingest_document ──────────────────────────────────────────────────────

pub struct IngestDocumentTool;

#[async_trait]
impl Tool for IngestDocumentTool {
    fn name(&self) -> &str {
        "ingest_document"
    }

    fn description(&self) -> &str {
        "Ingest a CV or job description into storage. Supports local paths, URLs, and raw text \
         in several formats (PDF, HTML, Markdown). Returns a URI for later use."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, URL, or raw markdown content to ingest"
                },
                "type": {
                    "type": "string",
                    "description": "Document type: 'cv' or 'jd'",
                    "enum": ["cv", "jd"],
                    "default": "cv"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let path = required_str(&params, "path")?;
        let doc_type = params
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("cv");

        let cancel = CancellationToken::new();
        let outcome = ctx.ingestor.ingest(path, doc_type, &cancel).await?;

        if let Some(degraded) = &outcome.degraded {
            return Ok(format!(
                "Document ingested with degraded operation!\n\n\
                 URI: {}\n{}\n\n\
                 Note: Some features may be limited due to temporary issues. \
                 The core functionality remains available.",
                outcome.uri, degraded
            ));
        }

        Ok(format!(
            "Document ingested successfully!\n\n\
             URI: {}\n\n\
             Use this URI in the analyze_fit prompt to analyze the document.",
            outcome.uri
        ))
    }
}

// ── list_documents ───────────────────────────────────────────────────────

pub struct ListDocumentsTool;

#[async_trait]
impl Tool for ListDocumentsTool {
    fn name(&self) -> &str {
        "list_documents"
    }

    fn description(&self) -> &str {
        "List all stored documents (CVs and job descriptions) by their IDs. \
         Returns a listing of document URIs grouped by kind."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "type": {
                    "type": "string",
                    "description": "Optional filter: 'cv' for CVs only, 'jd' for job descriptions only",
                    "enum": ["cv", "jd"]
                }
            },
            "required": []
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let filter = match params.get("type").and_then(Value::as_str) {
            None | Some("") => None,
            Some(s) => Some(DocumentKind::parse(s).ok_or_else(|| {
                Error::validation("type", format!("invalid type '{s}'. Use 'cv', 'jd', or leave empty"))
            })?),
        };

        let (cv_ids, jd_ids) = ctx.store.list_all()?;
        let cvs: &[String] = if filter == Some(DocumentKind::Jd) { &[] } else { &cv_ids };
        let jds: &[String] = if filter == Some(DocumentKind::Cv) { &[] } else { &jd_ids };

        if cvs.is_empty() && jds.is_empty() {
            return Ok("No documents found in storage.".to_string());
        }

        let mut out = String::from("Stored Documents:\n\n");
        if !cvs.is_empty() {
            out.push_str(&format!("CV Documents ({}):\n", cvs.len()));
            for id in cvs {
                out.push_str(&format!("- cv://{id}\n"));
            }
            out.push('\n');
        }
        if !jds.is_empty() {
            out.push_str(&format!("Job Descriptions ({}):\n", jds.len()));
            for id in jds {
                out.push_str(&format!("- jd://{id}\n"));
            }
        }
        Ok(out)
    }
}

// ── cleanup_storage ──────────────────────────────────────────────────────

pub struct CleanupStorageTool;

#[async_trait]
impl Tool for CleanupStorageTool {
    fn name(&self) -> &str {
        "cleanup_storage"
    }

    fn description(&self) -> &str {
        "Remove documents older than the specified TTL from storage. \
         Useful for maintaining storage hygiene."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ttl": {
                    "type": "string",
                    "description": "Time to live (e.g., '24h', '90m', or hours as a number). Uses the default TTL if not specified."
                }
            },
            "required": []
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let ttl = match params.get("ttl").and_then(Value::as_str) {
            None | Some("") => std::time::Duration::ZERO,
            Some(raw) => parse_ttl_arg(raw).ok_or_else(|| {
                Error::validation(
                    "ttl",
                    "invalid TTL format. Use a duration string (e.g., '24h') or hours as a number",
                )
            })?,
        };

        let (cv_before, jd_before) = ctx.store.stats()?;
        let removed = ctx.store.cleanup(ttl)?;
        let (cv_after, jd_after) = ctx.store.stats()?;

        let ttl_display = if ttl.is_zero() {
            format!("default ({}s)", ctx.store.default_ttl().as_secs())
        } else {
            format!("{}s", ttl.as_secs())
        };

        Ok(format!(
            "Storage cleanup completed!\n\n\
             TTL used: {ttl_display}\n\
             Files removed: {removed}\n\n\
             Storage statistics:\n\
             - CVs before: {cv_before}, after: {cv_after}\n\
             - Job descriptions before: {jd_before}, after: {jd_after}"
        ))
    }
}

// ── analyze_cv_jd ────────────────────────────────────────────────────────

pub struct AnalyzeTool;

#[async_trait]
impl Tool for AnalyzeTool {
    fn name(&self) -> &str {
        "analyze_cv_jd"
    }

    fn description(&self) -> &str {
        "Structured CV/job-description analysis with BM25 match scoring. \
         Returns match percentage, skill coverage, and gap analysis."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cv_uri": {
                    "type": "string",
                    "description": "URI of ingested CV (cv://[id])"
                },
                "jd_uri": {
                    "type": "string",
                    "description": "URI of ingested job description (jd://[id])"
                }
            },
            "required": ["cv_uri", "jd_uri"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let cv_uri = required_str(&params, "cv_uri")?;
        let jd_uri = required_str(&params, "jd_uri")?;
        validate_doc_uri(&ctx.store, "cv_uri", cv_uri, DocumentKind::Cv)?;
        validate_doc_uri(&ctx.store, "jd_uri", jd_uri, DocumentKind::Jd)?;

        let cv_body = ctx.store.read_body(cv_uri)?;
        let jd_body = ctx.store.read_body(jd_uri)?;

        let result = ctx.engine.analyze(&cv_body, &jd_body)?;
        let summary = build_summary(&result);

        let mut json = serde_json::to_value(&result)
            .map_err(|e| Error::Internal(format!("failed to encode analysis result: {e}")))?;
        if let Some(obj) = json.as_object_mut() {
            obj.insert("analysis_summary".to_string(), Value::String(summary));
        }

        serde_json::to_string_pretty(&json)
            .map_err(|e| Error::Internal(format!("failed to format analysis result: {e}")))
    }
}

/// Renders the human-readable analysis report embedded in the tool output.
fn build_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("CV/Job Description Analysis Report\n");
    out.push_str("==================================\n\n");

    out.push_str("Overall Scores:\n");
    out.push_str(&format!("  Match Percentage: {}%\n", result.match_percentage));
    out.push_str(&format!("  Weighted Score: {}/100\n", result.weighted_score));
    out.push_str(&format!("  Skill Coverage: {:.1}%\n", result.skill_coverage * 100.0));
    out.push_str(&format!(
        "  Experience Match: {:.1}%\n\n",
        result.experience_match * 100.0
    ));

    let b = &result.scoring_breakdown;
    out.push_str("Scoring Breakdown:\n");
    out.push_str(&format!("  Skill Coverage (40%): {:.1}%\n", b.skill_coverage * 100.0));
    out.push_str(&format!("  Experience (30%): {:.1}%\n", b.experience * 100.0));
    out.push_str(&format!("  Term Similarity (20%): {:.1}%\n", b.term_similarity * 100.0));
    out.push_str(&format!("  Overall Match (10%): {:.1}%\n\n", b.overall_match * 100.0));

    if !result.present_skills.is_empty() {
        out.push_str("Present Skills (CV):\n");
        for (i, skill) in result.present_skills.iter().take(10).enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, skill));
        }
        out.push('\n');
    }

    if !result.top_skills.is_empty() {
        out.push_str("Top Matching Skills:\n");
        for (i, skill) in result.top_skills.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, skill));
        }
        out.push('\n');
    }

    if !result.missing_skills.is_empty() {
        out.push_str("Missing Skills (gaps to address):\n");
        for (i, skill) in result.missing_skills.iter().take(10).enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, skill));
        }
        out.push('\n');
    }

    if !result.common_terms.is_empty() {
        out.push_str("Detailed Term Analysis (Top 5):\n");
        for ts in result.common_terms.iter().take(5) {
            out.push_str(&format!("  {} (score: {:.2})\n", ts.term, ts.score));
        }
    }

    out
}

// ── generate_interview_questions ─────────────────────────────────────────

pub struct InterviewQuestionsTool;

#[async_trait]
impl Tool for InterviewQuestionsTool {
    fn name(&self) -> &str {
        "generate_interview_questions"
    }

    fn description(&self) -> &str {
        "Generate targeted interview questions based on CV and job description gap analysis. \
         Returns a prompt focused on skills gaps, areas needing clarification, and \
         technical/behavioral balance."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cv_uri": {
                    "type": "string",
                    "description": "URI of ingested CV (cv://[id])"
                },
                "jd_uri": {
                    "type": "string",
                    "description": "URI of ingested job description (jd://[id])"
                },
                "style": {
                    "type": "string",
                    "description": "Question style: 'technical', 'behavioral', or 'comprehensive' (default)",
                    "enum": ["technical", "behavioral", "comprehensive"],
                    "default": "comprehensive"
                },
                "count": {
                    "type": "integer",
                    "description": "Number of questions to generate (default: 5)",
                    "minimum": 1,
                    "maximum": 20,
                    "default": 5
                }
            },
            "required": ["cv_uri", "jd_uri"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let cv_uri = required_str(&params, "cv_uri")?;
        let jd_uri = required_str(&params, "jd_uri")?;
        validate_doc_uri(&ctx.store, "cv_uri", cv_uri, DocumentKind::Cv)?;
        validate_doc_uri(&ctx.store, "jd_uri", jd_uri, DocumentKind::Jd)?;

        let style = match params.get("style").and_then(Value::as_str) {
            None | Some("") => InterviewStyle::Comprehensive,
            Some(s) => InterviewStyle::parse(s).ok_or_else(|| {
                Error::validation(
                    "style",
                    format!("invalid style '{s}'. Must be 'technical', 'behavioral', or 'comprehensive'"),
                )
            })?,
        };

        let count = match params.get("count") {
            None | Some(Value::Null) => 5,
            Some(v) => {
                let n = v
                    .as_i64()
                    .ok_or_else(|| Error::validation("count", "must be an integer"))?;
                if !(1..=20).contains(&n) {
                    return Err(Error::validation("count", "must be between 1 and 20"));
                }
                n as u32
            }
        };

        Ok(build_interview_questions_prompt(cv_uri, jd_uri, style, count))
    }
}
