//! REST API for advisory IOC lookups

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{Advisory, GroupEntry, SearchResult, Stats};
use crate::storage::ThreatIntelRepo;

/// Application state shared across handlers
pub struct AppState {
    pub repo: ThreatIntelRepo,
}

/// Query string for the direct-link lookup (`?ip=...`)
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub ip: Option<String>,
}

/// Free text to scan for addresses
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub text: String,
}

type ApiError = (StatusCode, Json<Value>);

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Lookup
        .route("/api/v1/lookup", get(lookup_ip))
        .route("/api/v1/lookup/:value", get(lookup_ip_by_path))
        .route("/api/v1/scan", post(scan_text))

        // Dataset views
        .route("/api/v1/stats", get(get_stats))
        .route("/api/v1/groups", get(list_groups))
        .route("/api/v1/advisories/:id", get(get_advisory))

        .with_state(state)
}

// ==================== Handlers ====================

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let dataset = state.repo.dataset();
    Json(json!({
        "status": "healthy",
        "service": "ransomwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "advisories": dataset.advisories.len(),
        "iocs": dataset.iocs.len(),
    }))
}

async fn lookup_ip(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<SearchResult>, ApiError> {
    let ip = params.ip.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing 'ip' parameter" })),
        )
    })?;

    Ok(Json(state.repo.search_ip(&ip)))
}

async fn lookup_ip_by_path(
    State(state): State<Arc<AppState>>,
    Path(value): Path<String>,
) -> Json<SearchResult> {
    Json(state.repo.search_ip(&value))
}

async fn scan_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> Json<Value> {
    let results = state.repo.scan_text(&req.text);
    let found = results.iter().filter(|r| r.found()).count();

    tracing::info!(addresses = results.len(), found, "Scanned text");

    Json(json!({
        "total": results.len(),
        "found": found,
        "results": results,
    }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Stats> {
    Json(state.repo.get_stats())
}

async fn list_groups(State(state): State<Arc<AppState>>) -> Json<Vec<GroupEntry>> {
    Json(state.repo.list_groups())
}

async fn get_advisory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Advisory>, ApiError> {
    state
        .repo
        .get_advisory(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            tracing::warn!(advisory_id = %id, "Advisory not found");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Advisory not found" })),
            )
        })
}
