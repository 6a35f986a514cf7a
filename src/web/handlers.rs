//! HTTP handlers for API endpoints.

use crate::error::{ErrorKind, LabError};
use crate::sensor::{DashboardSnapshot, Offsets};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};

/// Get the latest dashboard snapshot as JSON.
pub async fn get_snapshot(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.latest())
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.latest();
    Json(json!({
        "status": "ok",
        "service": "labkit",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "ticks": snapshot.ticks,
        "websocket_clients": state.connected_clients(),
    }))
}

pub async fn heat(State(state): State<AppState>) -> Result<Json<Offsets>, StatusCode> {
    let step = state.config.control_step_c;
    control_response("heat", state.controls.heat(step))
}

pub async fn cool(State(state): State<AppState>) -> Result<Json<Offsets>, StatusCode> {
    let step = state.config.control_step_c;
    control_response("cool", state.controls.cool(step))
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<Offsets>, StatusCode> {
    control_response("reset", state.controls.reset())
}

#[derive(Debug, Deserialize)]
pub struct AutoRequest {
    pub enabled: bool,
}

pub async fn set_auto(
    State(state): State<AppState>,
    Json(request): Json<AutoRequest>,
) -> Result<Json<Offsets>, StatusCode> {
    control_response("auto", state.controls.set_auto(request.enabled))
}

fn control_response(action: &str, result: Result<Offsets, LabError>) -> Result<Json<Offsets>, StatusCode> {
    match result {
        Ok(offsets) => {
            info!(
                action,
                temperature_offset = offsets.temperature_c,
                humidity_offset = offsets.humidity_pct,
                auto = offsets.auto,
                "sensor control applied"
            );
            Ok(Json(offsets))
        }
        Err(e) if e.kind() == ErrorKind::MalformedInput => {
            warn!(action, "rejected sensor control: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(action, "failed to apply sensor control: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Serve `index.html` from the configured static directory.
pub async fn serve_index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let Some(dir) = state.config.static_path.as_deref() else {
        return Ok(Html(DASHBOARD_HTML.to_string()));
    };

    match tokio::fs::read_to_string(Path::new(dir).join("index.html")).await {
        Ok(content) => Ok(Html(content)),
        Err(e) => {
            error!("Failed to read index.html: {}", e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Serve the embedded dashboard page.
pub async fn default_index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = include_str!("dashboard.html");
