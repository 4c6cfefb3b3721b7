// Participant leaderboard

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bugbash_core::{Participant, ParticipantDirectory};
use std::sync::Arc;

use crate::common::{api_error, ApiError, ListResponse};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn ParticipantDirectory>,
}

impl AppState {
    pub fn new(directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self { directory }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/participant/list/:campaign", get(list_participants))
        .with_state(state)
}

/// List a campaign's participants, highest score first
#[utoipa::path(
    get,
    path = "/participant/list/{campaign}",
    params(
        ("campaign" = String, Path, description = "Campaign name")
    ),
    responses(
        (status = 200, description = "Participants", body = ListResponse<Participant>),
        (status = 503, description = "Store unavailable")
    ),
    tag = "participants"
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(campaign): Path<String>,
) -> Result<Json<ListResponse<Participant>>, ApiError> {
    let participants = state
        .directory
        .list_participants(&campaign)
        .await
        .map_err(api_error)?;
    Ok(Json(participants.into()))
}
