//! Library query routes used by the poster wall front end.
//!
//! Reads go straight to the index snapshot and never wait on a running scan.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use posterwall_common::{EntryId, MediaKind, ResolutionState};
use serde::{Deserialize, Serialize};

use super::AppContext;
use crate::library::MediaEntry;
use crate::scanner::{ScanPhase, ScanSummary};

/// Poster shown for entries without resolved artwork.
pub const PLACEHOLDER_POSTER: &str = "/static/placeholder-poster.svg";

pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/library/status", get(scan_status))
        .route("/library/refresh", post(refresh_library))
        .route("/library/entry/:entry_id", get(get_entry))
        .route("/library/:kind", get(list_entries))
}

// ============================================================================
// Response types
// ============================================================================

/// One poster wall tile.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: String,
    pub kind: MediaKind,
    /// Canonical title when resolved, else the parsed one
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Always set; the placeholder unless the entry is resolved with artwork
    pub poster_url: String,
    pub synopsis: Option<String>,
    pub resolution_state: ResolutionState,
    pub last_scanned_at: DateTime<Utc>,
}

impl From<&MediaEntry> for EntryResponse {
    fn from(entry: &MediaEntry) -> Self {
        let poster_url = match (&entry.resolution_state, entry.poster_url.as_deref()) {
            (ResolutionState::Resolved, Some(url)) if !url.is_empty() => url.to_string(),
            _ => PLACEHOLDER_POSTER.to_string(),
        };
        Self {
            id: entry.id.to_string(),
            kind: entry.kind,
            title: entry.display_title().to_string(),
            year: entry.year,
            season: entry.season,
            episode: entry.episode,
            poster_url,
            synopsis: entry.synopsis.clone(),
            resolution_state: entry.resolution_state,
            last_scanned_at: entry.last_scanned_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub started: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub phase: ScanPhase,
    pub running: bool,
    pub entries: usize,
    pub last_scan: Option<ScanSummary>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_entries(
    State(ctx): State<AppContext>,
    Path(kind): Path<String>,
) -> impl IntoResponse {
    let kind: MediaKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response();
        }
    };

    let entries: Vec<EntryResponse> = ctx
        .index
        .list_by_kind(kind)
        .iter()
        .map(|e| EntryResponse::from(e.as_ref()))
        .collect();
    Json(entries).into_response()
}

async fn get_entry(
    State(ctx): State<AppContext>,
    Path(entry_id): Path<String>,
) -> impl IntoResponse {
    let Some(id) = EntryId::parse(&entry_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Invalid entry ID" })),
        )
            .into_response();
    };

    match ctx.index.get(id) {
        Some(entry) if !entry.is_tombstoned() => {
            Json(EntryResponse::from(entry.as_ref())).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Entry not found" })),
        )
            .into_response(),
    }
}

async fn refresh_library(
    State(ctx): State<AppContext>,
    Query(query): Query<RefreshQuery>,
) -> impl IntoResponse {
    let started = ctx.scans.trigger(query.force);
    if started {
        tracing::info!(force = query.force, "Manual library refresh started");
    } else {
        tracing::debug!("Manual refresh ignored, scan already running");
    }
    (StatusCode::ACCEPTED, Json(RefreshResponse { started }))
}

async fn scan_status(State(ctx): State<AppContext>) -> impl IntoResponse {
    let orchestrator = ctx.scans.orchestrator();
    Json(StatusResponse {
        phase: orchestrator.phase(),
        running: orchestrator.is_running(),
        entries: ctx.index.len(),
        last_scan: orchestrator.last_summary(),
    })
}
