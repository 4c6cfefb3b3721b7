// Core traits for pluggable backends
//
// These traits allow the scoring engine and poller to be used with different backends:
// - In-memory implementations for examples and testing
// - Database implementations for production

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::message::FixEventMessage;
use crate::participant::Participant;
use crate::poll::{FixEventRecord, PollCursor};

// ============================================================================
// ScoringStore - Everything the scoring pipeline reads and writes
// ============================================================================

/// Persistence capability consumed by the resolver, calculator and pipeline
#[async_trait]
pub trait ScoringStore: Send + Sync {
    /// Whether (event source, repository owner) is a tracked organization
    async fn is_organization_valid(&self, event_source: &str, repo_owner: &str) -> Result<bool>;

    /// Participants whose login matches the trigger user and whose campaign is active at `now`
    async fn select_participants_to_score(
        &self,
        message: &FixEventMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Participant>>;

    /// Point value of a leaf classification label in a campaign.
    ///
    /// Unconfigured labels and lookup failures collapse to the store's default.
    async fn select_point_value(&self, message: &FixEventMessage, campaign: &str, label: &str)
        -> f64;

    /// Points last recorded for this participant and this change (0 when never scored)
    async fn select_prior_score(&self, participant: &Participant, message: &FixEventMessage)
        -> f64;

    /// Append a score event holding the absolute new total
    async fn insert_score_event(
        &self,
        participant: &Participant,
        message: &FixEventMessage,
        new_points: f64,
    ) -> Result<()>;

    /// Apply a signed adjustment to the participant's running score
    async fn update_participant_score(&self, participant: &Participant, delta: f64) -> Result<()>;
}

// ============================================================================
// PollCursorStore - Persisted poller watermark
// ============================================================================

#[async_trait]
pub trait PollCursorStore: Send + Sync {
    /// Load the cursor with this identity; a missing row yields a fresh cursor
    async fn select_poll_cursor(&self, id: &str) -> Result<PollCursor>;

    async fn update_poll_cursor(&self, cursor: &PollCursor) -> Result<()>;
}

// ============================================================================
// FixEventSource - Where unprocessed fix event records come from
// ============================================================================

#[async_trait]
pub trait FixEventSource: Send + Sync {
    /// Records whose `(received_at, id)` sorts strictly after the cursor position, oldest first
    async fn fetch_after(&self, cursor: &PollCursor) -> Result<Vec<FixEventRecord>>;
}

// ============================================================================
// ParticipantDirectory - Read-only roster access
// ============================================================================

#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Participants of a campaign, highest score first
    async fn list_participants(&self, campaign: &str) -> Result<Vec<Participant>>;
}
