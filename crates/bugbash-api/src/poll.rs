// Admin poller endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bugbash_worker::{PollScheduler, PollerStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::common::{api_error, ApiError};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<PollScheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<PollScheduler>) -> Self {
        Self { scheduler }
    }
}

/// Request to move the poll cursor
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCursorRequest {
    /// Records received after this instant are polled next
    pub last_polled: DateTime<Utc>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/admin/poll", get(get_status))
        .route("/admin/poll/cursor", put(set_cursor))
        .with_state(state)
}

/// Poller status and persisted cursor
#[utoipa::path(
    get,
    path = "/admin/poll",
    responses(
        (status = 200, description = "Poller status", body = PollerStatus),
        (status = 401, description = "Missing or invalid admin credentials"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
pub async fn get_status(State(state): State<AppState>) -> Result<Json<PollerStatus>, ApiError> {
    state.scheduler.status().await.map(Json).map_err(api_error)
}

/// Override the poll cursor
#[utoipa::path(
    put,
    path = "/admin/poll/cursor",
    request_body = SetCursorRequest,
    responses(
        (status = 204, description = "Cursor updated"),
        (status = 401, description = "Missing or invalid admin credentials"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
pub async fn set_cursor(
    State(state): State<AppState>,
    Json(req): Json<SetCursorRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .scheduler
        .set_cursor(req.last_polled)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
