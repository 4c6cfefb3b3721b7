// Participant resolution
//
// Decides which enrolled participants a fix event scores for. Events from
// untracked organizations and unknown users are expected and silently yield
// no participants; only store failures are errors.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::message::FixEventMessage;
use crate::participant::Participant;
use crate::traits::ScoringStore;

/// Resolve the active participants a fix event applies to.
///
/// A login may be enrolled in several campaigns that are active at once;
/// every such enrollment is returned and scored independently.
pub async fn resolve_participants<S>(
    store: &S,
    message: &FixEventMessage,
    now: DateTime<Utc>,
) -> Result<Vec<Participant>>
where
    S: ScoringStore + ?Sized,
{
    if !store
        .is_organization_valid(&message.event_source, &message.repo_owner)
        .await?
    {
        debug!(
            event_source = %message.event_source,
            repo_owner = %message.repo_owner,
            "Ignoring fix event from untracked organization"
        );
        return Ok(Vec::new());
    }

    let message = message.normalized();
    let participants = store.select_participants_to_score(&message, now).await?;

    if participants.is_empty() {
        debug!(
            trigger_user = %message.trigger_user,
            "No active participant for fix event"
        );
    }

    Ok(participants)
}
