//! Lineal HTTP REST API
//!
//! Axum-based HTTP server exposing the warehouse query surface plus an event
//! intake endpoint. Runs alongside the Unix socket IPC server.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! pure inner function. The inner functions are directly testable without
//! axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /health          — graph store status and counts
//! - GET  /version         — server version info
//! - POST /lineage         — scope-bounded lineage traversal
//! - GET  /entities/{guid} — single entity details
//! - POST /search          — free-text search over vertices
//! - GET  /types           — distinct vertex type names
//! - POST /nodes           — node-name search
//! - POST /hierarchy       — element-hierarchy traversal
//! - POST /events          — queue one change event (same JSON as TCP intake)

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use lineal_core::model::{
    ElementHierarchyRequest, LineageSearchRequest, NodeNamesSearchCriteria, Scope,
};
use lineal_core::{LineageEvent, LinealConfig};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::subsystems::warehouse::WarehouseHandler;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub handler: WarehouseHandler,
    pub events_tx: mpsc::Sender<LineageEvent>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/lineage", post(lineage_handler))
        .route("/entities/:guid", get(entity_handler))
        .route("/search", post(search_handler))
        .route("/types", get(types_handler))
        .route("/nodes", post(nodes_handler))
        .route("/hierarchy", post(hierarchy_handler))
        .route("/events", post(events_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    handler: WarehouseHandler,
    events_tx: mpsc::Sender<LineageEvent>,
    config: LinealConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { handler, events_tx });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Lineal HTTP API listening on http://{}", addr);

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
pub struct LineageRequestBody {
    pub scope: Scope,
    pub guid: String,
    #[serde(default = "default_true")]
    pub include_processes: bool,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub async fn health_inner(handler: &WarehouseHandler) -> (StatusCode, serde_json::Value) {
    let (vertices, edges) = handler.counts().await;
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "vertices": vertices,
            "edges": edges,
        }),
    )
}

pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "lineal/1",
    })
}

pub async fn lineage_inner(
    handler: &WarehouseHandler,
    body: &LineageRequestBody,
) -> (StatusCode, serde_json::Value) {
    let result = handler
        .lineage(body.scope, &body.guid, body.include_processes)
        .await;
    match serde_json::to_value(&result) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": e.to_string()}),
        ),
    }
}

pub async fn entity_inner(
    handler: &WarehouseHandler,
    guid: &str,
) -> (StatusCode, serde_json::Value) {
    match handler.entity_details(guid).await {
        Ok(vertex) => match serde_json::to_value(&vertex) {
            Ok(data) => (StatusCode::OK, data),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": e.to_string()}),
            ),
        },
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            serde_json::json!({"error": e.to_string()}),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": e.to_string()}),
        ),
    }
}

pub async fn search_inner(
    handler: &WarehouseHandler,
    request: &LineageSearchRequest,
) -> (StatusCode, serde_json::Value) {
    let hits = handler.search(request).await;
    let count = hits.len();
    (
        StatusCode::OK,
        serde_json::json!({"results": hits, "count": count}),
    )
}

pub async fn types_inner(handler: &WarehouseHandler) -> (StatusCode, serde_json::Value) {
    let types = handler.types().await;
    (StatusCode::OK, serde_json::json!({"types": types}))
}

pub async fn nodes_inner(
    handler: &WarehouseHandler,
    criteria: &NodeNamesSearchCriteria,
) -> (StatusCode, serde_json::Value) {
    let nodes = handler.nodes(criteria).await;
    let count = nodes.len();
    (
        StatusCode::OK,
        serde_json::json!({"nodes": nodes, "count": count}),
    )
}

pub async fn hierarchy_inner(
    handler: &WarehouseHandler,
    request: &ElementHierarchyRequest,
) -> (StatusCode, serde_json::Value) {
    let result = handler.element_hierarchy(request).await;
    match serde_json::to_value(&result) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": e.to_string()}),
        ),
    }
}

/// Queue one change event onto the same intake channel the TCP listener
/// feeds; the consumer applies it asynchronously.
pub async fn events_inner(
    events_tx: &mpsc::Sender<LineageEvent>,
    event: LineageEvent,
) -> (StatusCode, serde_json::Value) {
    match events_tx.send(event).await {
        Ok(()) => (StatusCode::ACCEPTED, serde_json::json!({"queued": true})),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({"error": "intake queue closed"}),
        ),
    }
}

// ============================================================================
// Thin axum handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.handler).await;
    (status, Json(body))
}

async fn version_handler() -> impl IntoResponse {
    Json(version_inner())
}

async fn lineage_handler(
    State(state): State<Arc<HttpState>>,
    Json(body): Json<LineageRequestBody>,
) -> impl IntoResponse {
    let (status, body) = lineage_inner(&state.handler, &body).await;
    (status, Json(body))
}

async fn entity_handler(
    State(state): State<Arc<HttpState>>,
    Path(guid): Path<String>,
) -> impl IntoResponse {
    let (status, body) = entity_inner(&state.handler, &guid).await;
    (status, Json(body))
}

async fn search_handler(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<LineageSearchRequest>,
) -> impl IntoResponse {
    let (status, body) = search_inner(&state.handler, &request).await;
    (status, Json(body))
}

async fn types_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = types_inner(&state.handler).await;
    (status, Json(body))
}

async fn nodes_handler(
    State(state): State<Arc<HttpState>>,
    Json(criteria): Json<NodeNamesSearchCriteria>,
) -> impl IntoResponse {
    let (status, body) = nodes_inner(&state.handler, &criteria).await;
    (status, Json(body))
}

async fn hierarchy_handler(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<ElementHierarchyRequest>,
) -> impl IntoResponse {
    let (status, body) = hierarchy_inner(&state.handler, &request).await;
    (status, Json(body))
}

async fn events_handler(
    State(state): State<Arc<HttpState>>,
    Json(event): Json<LineageEvent>,
) -> impl IntoResponse {
    let (status, body) = events_inner(&state.events_tx, event).await;
    (status, Json(body))
}
