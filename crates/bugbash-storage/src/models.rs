// Database models (internal, converted to core types at the trait boundary)

use bugbash_core::{FixEventRecord, Participant, PollCursor};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Participants
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub id: Uuid,
    pub campaign_name: String,
    pub scp_name: String,
    pub login_name: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub team_name: Option<String>,
    pub score: f64,
    pub joined_at: DateTime<Utc>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Participant {
            id: row.id,
            campaign_name: row.campaign_name,
            scp_name: row.scp_name,
            login_name: row.login_name,
            email: row.email,
            display_name: row.display_name,
            team_name: row.team_name,
            score: row.score,
            joined_at: row.joined_at,
        }
    }
}

// ============================================
// Poll cursor
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct PollRow {
    pub id: String,
    pub last_polled: DateTime<Utc>,
    pub last_record_id: i64,
    pub last_poll_completed: Option<DateTime<Utc>>,
}

impl From<PollRow> for PollCursor {
    fn from(row: PollRow) -> Self {
        PollCursor {
            id: row.id,
            last_polled: row.last_polled,
            last_record_id: row.last_record_id,
            last_poll_completed: row.last_poll_completed,
        }
    }
}

// ============================================
// Fix event log
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct FixEventLogRow {
    pub id: i64,
    pub received_at: DateTime<Utc>,
    pub payload: sqlx::types::JsonValue,
}

impl From<FixEventLogRow> for FixEventRecord {
    fn from(row: FixEventLogRow) -> Self {
        FixEventRecord {
            id: row.id,
            received_at: row.received_at,
            payload: row.payload,
        }
    }
}
