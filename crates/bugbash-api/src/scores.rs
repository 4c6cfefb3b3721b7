// Manual replay of a fix event through the scoring pipeline

use axum::{extract::State, routing::post, Json, Router};
use bugbash_core::{apply_fix_event, AppliedScore, FixEventMessage, ScoringStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::common::{api_error, ApiError, ListResponse};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScoringStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ScoringStore>) -> Self {
        Self { store }
    }
}

/// Request to score one fix event
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    pub message: FixEventMessage,
    /// Instant used for campaign activity, defaults to the current time
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/admin/score", post(score_fix_event))
        .with_state(state)
}

/// Score a fix event immediately
#[utoipa::path(
    post,
    path = "/admin/score",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Scores applied", body = ListResponse<AppliedScore>),
        (status = 401, description = "Missing or invalid admin credentials"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
pub async fn score_fix_event(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ListResponse<AppliedScore>>, ApiError> {
    let now = req.now.unwrap_or_else(Utc::now);
    let applied = apply_fix_event(state.store.as_ref(), now, &req.message)
        .await
        .map_err(api_error)?;

    tracing::info!(
        trigger_user = %req.message.trigger_user,
        participants = applied.len(),
        "Replayed fix event"
    );

    Ok(Json(applied.into()))
}
