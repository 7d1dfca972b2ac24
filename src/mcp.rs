//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`], the document store, and the prompt builders
//! into an MCP Streamable HTTP endpoint that Claude, Cursor, and other MCP
//! clients can connect to using the standard JSON-RPC protocol.
//!
//! * **Tools** are exposed via `list_tools` / `call_tool`.
//! * **Stored documents** are exposed as resources under `cv://` / `jd://`.
//! * **Prompts** expose the `analyze_fit` analysis template.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::prompts::build_analyze_fit_prompt;
use crate::storage::{parse_uri, DocumentKind};
use crate::tools::{Tool as VibeTool, ToolContext, ToolRegistry};

/// Instructions surfaced to MCP clients during the initialize handshake.
const SERVER_INSTRUCTIONS: &str = r#"VibeCheck Server - CV Analysis Tool (portfolio/demo version)

This server provides CV and job description management with intelligent analysis.

**Note:** Demo-grade. Do not use with sensitive personal data.

## Transport

Streamable HTTP only. Connect via POST /mcp. Stdio transport is not supported.

## Resources

- cv://[id]: Access an ingested CV document
- jd://[id]: Access an ingested job description

## Tools

- ingest_document: Ingest a CV or job description (path, URL, or raw text). Returns a URI.
- list_documents: List stored documents by their URIs.
- cleanup_storage: Remove documents older than a TTL.
- analyze_cv_jd: Structured CV/JD analysis with BM25 match scoring.
- generate_interview_questions: Build an interview-question prompt from CV/JD gaps.

## Prompts

- analyze_fit: Structured fit analysis for an ingested CV and job description.

## Environment Variables

- VIBECHECK_STORAGE_PATH: Storage directory (default: ./storage)
- VIBECHECK_STORAGE_TTL: Default TTL for cleanup (default: 24h)
- VIBECHECK_PORT / PORT: HTTP server port (default: 8080)
"#;

/// Bridges the tool registry and document store to the MCP protocol.
///
/// Each MCP session receives a clone of this struct (everything is behind
/// `Arc`), so all sessions share the same tool set and store.
#[derive(Clone)]
pub struct McpBridge {
    tools: Arc<ToolRegistry>,
    ctx: Arc<ToolContext>,
}

impl McpBridge {
    pub fn new(tools: Arc<ToolRegistry>, ctx: Arc<ToolContext>) -> Self {
        Self { tools, ctx }
    }

    /// Convert a vibecheck tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn VibeTool) -> Tool {
        let schema_value = tool.parameters_schema();
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match schema_value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }

    fn document_resource(kind: DocumentKind, id: &str) -> Resource {
        let (name, description) = match kind {
            DocumentKind::Cv => (format!("CV: {id}"), "Stored CV document"),
            DocumentKind::Jd => (format!("JD: {id}"), "Stored job description"),
        };
        RawResource {
            uri: crate::storage::format_uri(kind, id),
            name,
            title: None,
            description: Some(description.to_string()),
            mime_type: Some("text/markdown".to_string()),
            size: None,
            icons: None,
        }
        .no_annotation()
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "vibecheck".to_string(),
                title: Some("VibeCheck Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        match tool.execute(params, &self.ctx).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Error: {e}"
            ))])),
        }
    }

    // ── Resources ────────────────────────────────────────────────────────

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let (cv_ids, jd_ids) = self.ctx.store.list_all().map_err(|e| {
            McpError::new(
                ErrorCode::INTERNAL_ERROR,
                format!("failed to list documents: {e}"),
                None,
            )
        })?;

        let mut resources = Vec::with_capacity(cv_ids.len() + jd_ids.len());
        for id in &cv_ids {
            resources.push(Self::document_resource(DocumentKind::Cv, id));
        }
        for id in &jd_ids {
            resources.push(Self::document_resource(DocumentKind::Jd, id));
        }
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;

        if parse_uri(&uri).is_err() {
            return Err(McpError::new(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("resource not found: {uri}"),
                None,
            ));
        }

        let body = self.ctx.store.read_body(&uri).map_err(|e| {
            tracing::debug!(uri = %uri, error = %e, "resource read failed");
            McpError::new(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("resource not found: {uri}"),
                None,
            )
        })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri,
                mime_type: Some("text/markdown".to_string()),
                text: body,
                meta: None,
            }],
        })
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        let templates = vec![
            RawResourceTemplate {
                uri_template: "cv://{id}".to_string(),
                name: "CV Document".to_string(),
                title: None,
                description: Some("Access a stored CV document by its ID".to_string()),
                mime_type: Some("text/markdown".to_string()),
            }
            .no_annotation(),
            RawResourceTemplate {
                uri_template: "jd://{id}".to_string(),
                name: "Job Description".to_string(),
                title: None,
                description: Some("Access a stored job description by its ID".to_string()),
                mime_type: Some("text/markdown".to_string()),
            }
            .no_annotation(),
        ];
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(templates)))
    }

    // ── Prompts ──────────────────────────────────────────────────────────

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        let prompts = vec![Prompt {
            name: "analyze_fit".to_string(),
            title: Some("Analyze CV/JD Fit".to_string()),
            description: Some(
                "Analyze fit between an ingested CV and job description with structured output"
                    .to_string(),
            ),
            arguments: Some(vec![
                PromptArgument {
                    name: "cv_uri".to_string(),
                    title: Some("CV URI".to_string()),
                    description: Some("URI of ingested CV (cv://[id])".to_string()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "jd_uri".to_string(),
                    title: Some("Job Description URI".to_string()),
                    description: Some(
                        "URI of ingested job description (jd://[id])".to_string(),
                    ),
                    required: Some(true),
                },
            ]),
            icons: None,
        }];
        std::future::ready(Ok(ListPromptsResult::with_all_items(prompts)))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        if request.name != "analyze_fit" {
            return Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no prompt registered with name: {}", request.name),
                None,
            ));
        }

        let args = request.arguments.unwrap_or_default();
        let cv_uri = args
            .get("cv_uri")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                McpError::new(ErrorCode::INVALID_PARAMS, "cv_uri parameter is required", None)
            })?;
        let jd_uri = args
            .get("jd_uri")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                McpError::new(ErrorCode::INVALID_PARAMS, "jd_uri parameter is required", None)
            })?;

        let check = |field: &str, uri: &str, expected: DocumentKind| {
            match parse_uri(uri) {
                Ok((kind, _)) if kind == expected => {}
                _ => {
                    return Err(McpError::new(
                        ErrorCode::INVALID_PARAMS,
                        format!("invalid {field}: must be {expected}:// format"),
                        None,
                    ))
                }
            }
            if !self.ctx.store.exists(uri) {
                return Err(McpError::new(
                    ErrorCode::INVALID_PARAMS,
                    format!("document not found: {uri}"),
                    None,
                ));
            }
            Ok(())
        };
        check("cv_uri", cv_uri, DocumentKind::Cv)?;
        check("jd_uri", jd_uri, DocumentKind::Jd)?;

        let prompt = build_analyze_fit_prompt(cv_uri, jd_uri);

        Ok(GetPromptResult {
            description: Some("Analyze CV and Job Description fit".to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, prompt)],
        })
    }
}
