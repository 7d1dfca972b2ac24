//! HTTP server: MCP endpoint, health probes, and the TTL sweeper.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/mcp` | MCP Streamable HTTP transport |
//! | `GET`  | `/health/live` | Liveness probe (unconditional 200) |
//! | `GET`  | `/health/ready` | Readiness probe (storage + optional langextract) |
//! | `GET`  | `/` | Plain-text endpoint listing |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin MCP tool calls.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::analyze::AnalysisEngine;
use crate::config::Config;
use crate::converter::ConverterRegistry;
use crate::dictionary::SkillsDictionary;
use crate::filesystem::OsFileSystem;
use crate::ingest::Ingestor;
use crate::mcp::McpBridge;
use crate::storage::DocumentStore;
use crate::tools::{ToolContext, ToolRegistry};

/// Interval between background TTL sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Timeout for the downstream langextract readiness check.
const LANGEXTRACT_TIMEOUT: Duration = Duration::from_secs(3);

/// Shared state for the health and index handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<DocumentStore>,
    langextract_host: Option<String>,
    http: reqwest::Client,
}

/// Starts the server and runs until shutdown.
///
/// Wires the store, converter registry, analysis engine, and tool registry
/// together, spawns the periodic TTL sweeper, and serves the MCP endpoint
/// plus health probes on the configured port.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let dictionary = Arc::new(match &config.skills_path {
        Some(path) => SkillsDictionary::from_path(path),
        None => SkillsDictionary::bundled(),
    });

    let store = Arc::new(DocumentStore::new(
        config.storage_path.clone(),
        config.storage_ttl,
        Arc::new(OsFileSystem),
    )?);

    let converters = Arc::new(ConverterRegistry::with_defaults());
    let ingestor = Arc::new(Ingestor::new(store.clone(), converters));
    let engine = Arc::new(AnalysisEngine::new(dictionary));
    let ctx = Arc::new(ToolContext {
        store: store.clone(),
        ingestor,
        engine,
    });
    let tools = Arc::new(ToolRegistry::with_builtins());
    let bridge = McpBridge::new(tools, ctx);

    spawn_cleanup_sweeper(store.clone());

    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let state = AppState {
        store,
        langextract_host: config.langextract_host.clone(),
        http: reqwest::Client::new(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health/live", get(handle_live))
        .route("/health/ready", get(handle_ready))
        .route("/", get(handle_index))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        port = config.port,
        storage_path = %config.storage_path.display(),
        storage_ttl_secs = config.storage_ttl.as_secs(),
        "mcp server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Periodic TTL sweep over the document store. Sweep failures are logged,
/// never fatal.
fn spawn_cleanup_sweeper(store: Arc<DocumentStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick fires immediately; skip it so a fresh start does
        // not sweep before anything could expire.
        interval.tick().await;
        loop {
            interval.tick().await;
            match store.cleanup(Duration::ZERO) {
                Ok(removed) => {
                    tracing::info!(removed, "periodic storage cleanup completed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "periodic storage cleanup failed");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}

// ── Health endpoints ─────────────────────────────────────────────────────

/// JSON body of the health endpoints.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<BTreeMap<String, String>>,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            service: "vibecheck-mcp".to_string(),
            checks: None,
        }
    }
}

/// `GET /health/live`: unconditional 200; the process is up.
async fn handle_live() -> Json<HealthResponse> {
    Json(HealthResponse::new("healthy"))
}

/// `GET /health/ready`: 200 when every dependency check passes, 503
/// otherwise, with per-dependency status in the body.
async fn handle_ready(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = BTreeMap::new();
    let mut ready = true;

    let storage_ok = state.store.is_accessible();
    checks.insert(
        "storage".to_string(),
        if storage_ok { "accessible" } else { "inaccessible" }.to_string(),
    );
    ready &= storage_ok;

    if let Some(host) = &state.langextract_host {
        let langextract_ok = check_langextract(&state.http, host).await;
        checks.insert(
            "langextract".to_string(),
            if langextract_ok { "accessible" } else { "inaccessible" }.to_string(),
        );
        ready &= langextract_ok;
    }

    let mut response = HealthResponse::new(if ready { "healthy" } else { "unhealthy" });
    response.checks = Some(checks);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Probes the downstream langextract service's health endpoint.
async fn check_langextract(client: &reqwest::Client, host: &str) -> bool {
    let url = format!("http://{host}/health");
    match client
        .get(&url)
        .timeout(LANGEXTRACT_TIMEOUT)
        .send()
        .await
    {
        Ok(response) if response.status() == StatusCode::OK => true,
        Ok(response) => {
            tracing::debug!(url, status = %response.status(), "langextract health check returned non-OK status");
            false
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "langextract health check failed");
            false
        }
    }
}

/// `GET /`: plain-text help listing the endpoints.
async fn handle_index() -> String {
    format!(
        "VibeCheck MCP Server\n\n\
         Endpoints:\n\
         \x20 POST /mcp          - Streamable HTTP transport (recommended)\n\
         \x20 GET  /health/live  - Liveness probe\n\
         \x20 GET  /health/ready - Readiness probe\n\
         \x20 GET  /             - This help message\n\n\
         Server: vibecheck {}\n",
        env!("CARGO_PKG_VERSION")
    )
}
