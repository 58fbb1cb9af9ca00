use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, Form, State};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use hk_core::{ListError, ShoppingEntry, StatusSnapshot};
use hk_list::ListService;
use hk_pool::StatusLog;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::render;

const DASHBOARD_PATH: &str = "/rebuy-dashboard";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub list: Arc<ListService>,
    pub pool_log: Arc<StatusLog>,
    /// Rows shown on the pool dashboard.
    pub dashboard_limit: usize,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/add", post(add_item))
        .route("/rebuy-delete", post(delete_item))
        .route("/rebuy-clear-all", post(clear_all))
        .route(DASHBOARD_PATH, get(rebuy_dashboard))
        .route("/pool-log", get(pool_log))
        .route("/pool-dashboard", get(pool_dashboard))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(max_body_bytes.max(1)))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AddRequest {
    item: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    id: Option<String>,
}

/// Run storage work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

async fn add_item(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    // Any body that is not an object with string fields is the same client error.
    let request: AddRequest = serde_json::from_slice(&body).map_err(|error| {
        debug!(%error, "rejecting /add body");
        ApiError::from(ListError::MissingField)
    })?;
    let (Some(item), Some(source)) = (request.item, request.source) else {
        return Err(ListError::MissingField.into());
    };

    let list = Arc::clone(&state.list);
    blocking(move || Ok(list.add(&item, &source)?)).await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn delete_item(
    State(state): State<AppState>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let id = match form {
        Ok(Form(DeleteForm { id })) => id.filter(|id| !id.trim().is_empty()),
        Err(rejection) => {
            debug!(error = %rejection, "ignoring unreadable delete form");
            None
        }
    };

    if let Some(id) = id {
        let list = Arc::clone(&state.list);
        blocking(move || Ok(list.delete(&id)?)).await?;
    }
    Ok(Redirect::to(DASHBOARD_PATH))
}

async fn clear_all(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let list = Arc::clone(&state.list);
    blocking(move || Ok(list.clear_all()?)).await?;
    Ok(Redirect::to(DASHBOARD_PATH))
}

async fn rebuy_dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let list = Arc::clone(&state.list);
    let entries: Vec<ShoppingEntry> = blocking(move || Ok(list.list_sorted()?)).await?;
    Ok(Html(render::rebuy_dashboard(&entries)))
}

async fn pool_log(State(state): State<AppState>) -> Result<Json<Vec<StatusSnapshot>>, ApiError> {
    let log = Arc::clone(&state.pool_log);
    let snapshots = blocking(move || {
        if !log.exists() {
            return Err(ApiError::NotFound("No pool log found".to_string()));
        }
        Ok(log.read_all()?)
    })
    .await?;
    Ok(Json(snapshots))
}

async fn pool_dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let log = Arc::clone(&state.pool_log);
    let limit = state.dashboard_limit;
    let mut snapshots = blocking(move || Ok(log.read_recent(limit)?)).await?;
    snapshots.reverse();
    Ok(Html(render::pool_dashboard(&snapshots)))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
