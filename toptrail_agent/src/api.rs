//! HTTP routes: capture control (`/capture`) and windowed reads (`/view`).

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/capture", post(start_capture).delete(stop_capture))
        .route("/view", get(view))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid duration format")]
    InvalidDuration,
    #[error("Error reading captured metrics")]
    Read(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidDuration => StatusCode::BAD_REQUEST,
            ApiError::Read(detail) => {
                error!("view failed: {detail}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Parse a relative span such as `30m`, `1h` or `1h30m`.
pub fn parse_window(raw: &str) -> Option<Duration> {
    humantime::parse_duration(raw.trim()).ok()
}

/// `now - window`, clamped to the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

async fn start_capture(State(state): State<AppState>) -> &'static str {
    state.controller.start().await;
    "Started capturing metrics.\n"
}

async fn stop_capture(State(state): State<AppState>) -> &'static str {
    state.controller.stop().await;
    "Stopped capturing metrics.\n"
}

async fn view(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let window = q
        .get("duration")
        .and_then(|d| parse_window(d))
        .ok_or(ApiError::InvalidDuration)?;
    let since = window_start(Utc::now(), window);

    let log = state.log.clone();
    let snapshots = tokio::task::spawn_blocking(move || log.query(since))
        .await
        .map_err(|e| ApiError::Read(e.to_string()))?
        .map_err(|e| ApiError::Read(e.to_string()))?;
    debug!(%since, count = snapshots.len(), "serving view");
    Ok(Json(snapshots).into_response())
}
