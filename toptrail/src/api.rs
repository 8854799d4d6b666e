//! Aggregator HTTP routes: dashboard page, server registry and top-N rankings.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::ranking::TopQuery;
use crate::registry::RegistryError;
use crate::state::AppState;
use crate::types::{ProcessInfo, ServerRecord};

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add-server", post(add_server))
        .route("/servers", get(list_servers))
        .route("/top", get(top_processes))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Internal(&'static str, String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Invalid(v) => ApiError::Invalid(v),
            RegistryError::Store(s) => ApiError::Internal("Failed to add server", s.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(v) => {
                warn!("rejecting request: {v}");
                (StatusCode::BAD_REQUEST, v.to_string()).into_response()
            }
            ApiError::Internal(message, detail) => {
                error!("{message}: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

fn store_failure(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |e| ApiError::Internal(message, e.to_string())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn add_server(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Redirect, ApiError> {
    state
        .registry
        .add(form_field(&form, "name"), form_field(&form, "url"))?;
    Ok(Redirect::to("/"))
}

fn form_field<'a>(form: &'a HashMap<String, String>, key: &str) -> &'a str {
    form.get(key).map(String::as_str).unwrap_or_default()
}

async fn list_servers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServerRecord>>, ApiError> {
    let servers = state
        .registry
        .list()
        .map_err(store_failure("Error fetching servers"))?;
    Ok(Json(servers))
}

async fn top_processes(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ProcessInfo>>, ApiError> {
    let query = TopQuery::parse(
        q.get("type").map(String::as_str),
        q.get("duration").map(String::as_str),
        q.get("serverId").map(String::as_str),
    )?;
    info!(
        metric = ?query.metric,
        server_id = query.server_id,
        window = %humantime::format_duration(query.window),
        "top query"
    );
    let rows = state
        .ranking
        .top(&query, Utc::now())
        .map_err(store_failure("Database query failed"))?;
    Ok(Json(rows))
}
