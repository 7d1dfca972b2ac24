//! # VibeCheck
//!
//! **A CV / job-description analysis server speaking MCP over HTTP.**
//!
//! VibeCheck ingests résumés and job descriptions from local paths, URLs, or
//! raw text, stores them by content-addressed identity, and computes a
//! structured similarity-and-coverage report between any (CV, JD) pair.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌─────────────┐
//! │  Converters  │──▶│  Ingestion   │──▶│  Document   │
//! │ PDF/HTML/MD  │   │  Pipeline    │   │   Store     │
//! └──────────────┘   └─────────────┘   └──────┬──────┘
//!                                             │
//!                        ┌────────────────────┤
//!                        ▼                    ▼
//!                  ┌───────────┐       ┌───────────┐
//!                  │  Matching │       │    MCP    │
//!                  │  Engine   │──────▶│  (HTTP)   │
//!                  └───────────┘       └───────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. An MCP client calls a tool on `POST /mcp` ([`mcp`], [`tools`]).
//! 2. `ingest_document` classifies the input, converts it to text through
//!    the [`converter`] registry (with [`retry`] and a raw-read fallback),
//!    and saves it to the [`storage`] store, which deduplicates by SHA-256.
//! 3. `analyze_cv_jd` reads both documents, strips their metadata
//!    frontmatter, and runs the [`analyze`] engine: BM25 term overlap
//!    ([`bm25`]) plus dictionary-driven skill extraction ([`skills`],
//!    [`dictionary`]) folded into a weighted score ([`scoring`]).
//! 4. Stored documents are exposed as `cv://` / `jd://` MCP resources; the
//!    `analyze_fit` prompt and the interview-question tool build LLM-targeted
//!    text from [`prompts`].
//! 5. A background task sweeps documents past their TTL; Kubernetes-style
//!    probes live under `/health` ([`server`]).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment-variable configuration, Go-style durations |
//! | [`errors`] | Error taxonomy with retryability classification |
//! | [`filesystem`] | Filesystem port: real OS and in-memory backends |
//! | [`storage`] | Content-addressed document store, URI grammar, TTL sweep |
//! | [`converter`] | Input classification, converter trait, registry |
//! | [`converter_pdf`] | PDF text extraction |
//! | [`converter_html`] | HTML fetch and static article extraction |
//! | [`retry`] | Backoff policies with jitter and an injectable sleeper |
//! | [`dictionary`] | Skill dictionary parsing and lookup |
//! | [`bm25`] | Tokenizer and BM25 term weighting |
//! | [`skills`] | Skill extraction, confidence, experience years |
//! | [`scoring`] | Weighted multi-factor aggregate score |
//! | [`analyze`] | The matching engine |
//! | [`ingest`] | Ingestion pipeline with degraded outcomes |
//! | [`prompts`] | Analysis and interview-question prompt builders |
//! | [`tools`] | The five MCP tools and their registry |
//! | [`mcp`] | rmcp `ServerHandler` bridge |
//! | [`server`] | axum router, health probes, TTL sweeper |

pub mod analyze;
pub mod bm25;
pub mod config;
pub mod converter;
pub mod converter_html;
pub mod converter_pdf;
pub mod dictionary;
pub mod errors;
pub mod filesystem;
pub mod ingest;
pub mod mcp;
pub mod prompts;
pub mod retry;
pub mod scoring;
pub mod server;
pub mod skills;
pub mod storage;
pub mod tools;
