//! Dermachat HTTP REST API
//!
//! Axum-based HTTP server exposing the chat pipeline and the vector-search
//! debug endpoints.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! pure inner function. The inner functions are directly testable without
//! axum dispatch machinery.
//!
//! Endpoints:
//! - POST   /chat                      — run one chat turn
//! - GET    /chat/history/:session_id  — fetch session history
//! - DELETE /chat/history/:session_id  — clear session history
//! - POST   /search/products           — direct product vector search
//! - POST   /search/blogs              — direct blog vector search
//! - GET    /health                    — liveness + DB round-trip

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use dermachat_core::search::{ArticleFilters, ProductFilters, VectorStore};
use dermachat_core::session::SessionStore;
use dermachat_core::DermachatConfig;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::agents::orchestrator::Orchestrator;

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub pool: PgPool,
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn VectorStore>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/history/:session_id", get(history_handler))
        .route("/chat/history/:session_id", delete(clear_history_handler))
        .route("/search/products", post(search_products_handler))
        .route("/search/blogs", post(search_blogs_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    config: &DermachatConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.service.host, config.service.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Dermachat HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSearchRequest {
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub filters: Option<ProductFilters>,
}

#[derive(Debug, Deserialize)]
pub struct BlogSearchRequest {
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub filters: Option<ArticleFilters>,
}

/// Server-generated session id: `session_<millis>_<random-suffix>`.
fn generate_session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..9].to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn bad_request(message: &str) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::BAD_REQUEST,
        serde_json::json!({
            "success": false,
            "error": message,
        }),
    )
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner chat — validates the message, resolves the session id, and runs the
/// orchestrated pipeline.
pub async fn chat_inner(
    orchestrator: &Orchestrator,
    req: ChatRequest,
) -> (StatusCode, serde_json::Value) {
    let message = match req.message {
        Some(m) => m,
        None => return bad_request("Message is required and must be a string"),
    };

    let trimmed = message.trim();
    if trimmed.is_empty() {
        return bad_request("Message cannot be empty");
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return bad_request("Message is too long (max 2000 characters)");
    }

    let session_id = match req.session_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => generate_session_id(),
    };

    let outcome = orchestrator.process(trimmed, &session_id).await;

    (
        StatusCode::OK,
        serde_json::json!({
            "success": outcome.success,
            "message": outcome.response,
            "sessionId": session_id,
            "metadata": outcome.metadata,
            "sources": outcome.sources,
        }),
    )
}

/// Inner history fetch.
pub async fn history_inner(
    sessions: &SessionStore,
    session_id: &str,
) -> (StatusCode, serde_json::Value) {
    if session_id.trim().is_empty() {
        return bad_request("Session ID is required");
    }

    let history = sessions.history(session_id).await;

    (
        StatusCode::OK,
        serde_json::json!({
            "success": true,
            "sessionId": session_id,
            "history": history,
            "count": history.len(),
        }),
    )
}

/// Inner history clear.
pub async fn clear_history_inner(
    sessions: &SessionStore,
    session_id: &str,
) -> (StatusCode, serde_json::Value) {
    if session_id.trim().is_empty() {
        return bad_request("Session ID is required");
    }

    sessions.clear(session_id).await;

    (
        StatusCode::OK,
        serde_json::json!({
            "success": true,
            "message": "Conversation history cleared",
            "sessionId": session_id,
        }),
    )
}

/// Inner product search — the direct vector-search debug endpoint.
pub async fn search_products_inner(
    store: &dyn VectorStore,
    req: ProductSearchRequest,
) -> (StatusCode, serde_json::Value) {
    let query = match req.query {
        Some(q) if !q.trim().is_empty() => q,
        _ => return bad_request("Query is required"),
    };

    let limit = req.limit.unwrap_or(5);
    let filters = req.filters.filter(|f| !f.is_empty());

    match store.search_products(&query, limit, filters).await {
        Ok(results) => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "query": query,
                "count": results.len(),
                "results": results,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Product search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "success": false,
                    "error": "Failed to search products",
                }),
            )
        }
    }
}

/// Inner blog search — the direct vector-search debug endpoint.
pub async fn search_blogs_inner(
    store: &dyn VectorStore,
    req: BlogSearchRequest,
) -> (StatusCode, serde_json::Value) {
    let query = match req.query {
        Some(q) if !q.trim().is_empty() => q,
        _ => return bad_request("Query is required"),
    };

    let limit = req.limit.unwrap_or(5);
    let filters = req.filters.filter(|f| !f.is_empty());

    match store.search_articles(&query, limit, filters).await {
        Ok(results) => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "query": query,
                "count": results.len(),
                "results": results,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Blog search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "success": false,
                    "error": "Failed to search blogs",
                }),
            )
        }
    }
}

/// Inner health check — one trivial DB round-trip.
pub async fn health_inner(pool: &PgPool) -> (StatusCode, serde_json::Value) {
    match dermachat_core::db::ping(pool).await {
        Ok(()) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "ok",
                "timestamp": Utc::now().to_rfc3339(),
                "database": "connected",
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({
                "status": "error",
                "timestamp": Utc::now().to_rfc3339(),
                "database": "disconnected",
                "error": e.to_string(),
            }),
        ),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let (status, body) = chat_inner(&state.orchestrator, req).await;
    (status, Json(body))
}

pub async fn history_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = history_inner(state.orchestrator.sessions(), &session_id).await;
    (status, Json(body))
}

pub async fn clear_history_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = clear_history_inner(state.orchestrator.sessions(), &session_id).await;
    (status, Json(body))
}

pub async fn search_products_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ProductSearchRequest>,
) -> impl IntoResponse {
    let (status, body) = search_products_inner(state.store.as_ref(), req).await;
    (status, Json(body))
}

pub async fn search_blogs_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<BlogSearchRequest>,
) -> impl IntoResponse {
    let (status, body) = search_blogs_inner(state.store.as_ref(), req).await;
    (status, Json(body))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
