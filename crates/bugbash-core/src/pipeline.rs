// Scoring pipeline
//
// Resolver + calculator + persistence for one fix event. Each resolved
// participant is processed independently: compute the new total, read the
// prior total for the same change, append a score event with the new total,
// then move the running score by the difference.
//
// There is no cross-participant atomicity. The first failed write stops the
// remaining participants; those already processed stay committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::Result;
use crate::message::FixEventMessage;
use crate::resolver::resolve_participants;
use crate::scoring::compute_score;
use crate::traits::ScoringStore;

/// Outcome of scoring one participant for one fix event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppliedScore {
    pub participant_id: Uuid,
    pub campaign_name: String,
    pub login_name: String,
    pub new_points: f64,
    pub prior_points: f64,
    pub delta: f64,
}

/// Score a fix event for every participant it resolves to.
///
/// A message that resolves to nobody is a successful no-op.
pub async fn apply_fix_event<S>(
    store: &S,
    now: DateTime<Utc>,
    message: &FixEventMessage,
) -> Result<Vec<AppliedScore>>
where
    S: ScoringStore + ?Sized,
{
    let message = message.normalized();
    let participants = resolve_participants(store, &message, now).await?;

    let mut applied = Vec::with_capacity(participants.len());

    for participant in &participants {
        let new_points = compute_score(store, &message, &participant.campaign_name).await;
        let prior_points = store.select_prior_score(participant, &message).await;
        let delta = new_points - prior_points;

        if let Err(e) = store
            .insert_score_event(participant, &message, new_points)
            .await
        {
            error!(
                participant_id = %participant.id,
                campaign = %participant.campaign_name,
                error = %e,
                "Failed to record score event"
            );
            return Err(e);
        }

        if let Err(e) = store.update_participant_score(participant, delta).await {
            error!(
                participant_id = %participant.id,
                campaign = %participant.campaign_name,
                delta = delta,
                error = %e,
                "Failed to update participant score"
            );
            return Err(e);
        }

        info!(
            participant_id = %participant.id,
            login = %participant.login_name,
            campaign = %participant.campaign_name,
            repo = %format!("{}/{}", message.repo_owner, message.repo_name),
            pull_request_id = message.pull_request_id,
            new_points = new_points,
            delta = delta,
            "Scored fix event"
        );

        applied.push(AppliedScore {
            participant_id: participant.id,
            campaign_name: participant.campaign_name.clone(),
            login_name: participant.login_name.clone(),
            new_points,
            prior_points,
            delta,
        });
    }

    Ok(applied)
}
