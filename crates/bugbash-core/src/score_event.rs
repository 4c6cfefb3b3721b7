// Score event entity type
//
// Append-only audit record of one scoring application. Holds the absolute
// point total computed for the participant, not the delta applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::message::FixEventMessage;
use crate::participant::Participant;

/// ScoreEvent - immutable record of one scoring computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ScoreEvent {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub campaign_name: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub pull_request_id: i64,
    pub points: f64,
    pub created_at: DateTime<Utc>,
}

impl ScoreEvent {
    pub fn new(participant: &Participant, message: &FixEventMessage, points: f64) -> Self {
        Self {
            id: Uuid::now_v7(),
            participant_id: participant.id,
            campaign_name: participant.campaign_name.clone(),
            repo_owner: message.repo_owner.clone(),
            repo_name: message.repo_name.clone(),
            pull_request_id: message.pull_request_id,
            points,
            created_at: Utc::now(),
        }
    }

    /// Whether this event scored the same participant for the same change
    pub fn supersedes_for(&self, participant: &Participant, message: &FixEventMessage) -> bool {
        self.participant_id == participant.id
            && self.repo_owner == message.repo_owner
            && self.repo_name == message.repo_name
            && self.pull_request_id == message.pull_request_id
    }
}
