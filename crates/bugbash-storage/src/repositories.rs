// Repository layer for database operations
//
// Database implements every core store trait directly. sqlx errors surface
// as BugBashError::Store; the two infallible lookups (point value, prior
// score) log and fall back instead.

use anyhow::Result;
use async_trait::async_trait;
use bugbash_core::{
    BugBashError, FixEventMessage, FixEventRecord, FixEventSource, Participant,
    ParticipantDirectory, PollCursor, PollCursorStore, ScoreEvent, ScoringStore,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::*;

/// Points a label is worth when the campaign has no value configured for it
pub const DEFAULT_POINT_VALUE: f64 = 1.0;

fn store_err(err: sqlx::Error) -> BugBashError {
    BugBashError::store(err.to_string())
}

/// Log rows younger than this are left for a later tick
///
/// An insert whose transaction commits late can carry a `received_at` below
/// rows that are already visible; holding back the newest rows keeps the
/// watermark from passing it.
pub const DEFAULT_FETCH_SETTLE: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    fetch_settle: Duration,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            fetch_settle: DEFAULT_FETCH_SETTLE,
        }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn with_fetch_settle(mut self, settle: Duration) -> Self {
        self.fetch_settle = settle;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Fix event log
    // ============================================

    /// Append a raw fix event payload to the log the poller reads from
    pub async fn append_fix_event(&self, payload: &serde_json::Value) -> Result<FixEventRecord> {
        let row = sqlx::query_as::<_, FixEventLogRow>(
            r#"
            INSERT INTO fix_event_log (payload)
            VALUES ($1)
            RETURNING id, received_at, payload
            "#,
        )
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

// ============================================
// Scoring
// ============================================

#[async_trait]
impl ScoringStore for Database {
    async fn is_organization_valid(
        &self,
        event_source: &str,
        repo_owner: &str,
    ) -> bugbash_core::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM organization o
                JOIN source_control_provider s ON s.id = o.fk_scp
                WHERE s.scp_name = $1 AND LOWER(o.organization) = LOWER($2)
            )
            "#,
        )
        .bind(event_source)
        .bind(repo_owner)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn select_participants_to_score(
        &self,
        message: &FixEventMessage,
        now: DateTime<Utc>,
    ) -> bugbash_core::Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT p.id, c.campaign_name, s.scp_name, p.login_name, p.email, p.display_name,
                   p.team_name, p.score, p.joined_at
            FROM participant p
            JOIN campaign c ON c.id = p.fk_campaign
            JOIN source_control_provider s ON s.id = p.fk_scp
            WHERE s.scp_name = $1
              AND LOWER(p.login_name) = LOWER($2)
              AND c.start_on <= $3
              AND c.end_on >= $3
            ORDER BY c.start_on, p.id
            "#,
        )
        .bind(&message.event_source)
        .bind(&message.trigger_user)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }

    async fn select_point_value(&self, message: &FixEventMessage, campaign: &str, label: &str) -> f64 {
        let result = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT b.point_value
            FROM bug b
            JOIN campaign c ON c.id = b.fk_campaign
            WHERE c.campaign_name = $1 AND b.category = $2
            "#,
        )
        .bind(campaign)
        .bind(label)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(campaign = %campaign, label = %label, "No point value configured, using default");
                DEFAULT_POINT_VALUE
            }
            Err(e) => {
                warn!(
                    campaign = %campaign,
                    label = %label,
                    repo_owner = %message.repo_owner,
                    error = %e,
                    "Point value lookup failed, using default"
                );
                DEFAULT_POINT_VALUE
            }
        }
    }

    async fn select_prior_score(&self, participant: &Participant, message: &FixEventMessage) -> f64 {
        let result = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT points
            FROM score_event
            WHERE fk_participant = $1 AND LOWER(repo_owner) = LOWER($2) AND repo_name = $3 AND pr = $4
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(participant.id)
        .bind(&message.repo_owner)
        .bind(&message.repo_name)
        .bind(message.pull_request_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(points) => points.unwrap_or(0.0),
            Err(e) => {
                warn!(
                    participant_id = %participant.id,
                    error = %e,
                    "Prior score lookup failed, treating as unscored"
                );
                0.0
            }
        }
    }

    async fn insert_score_event(
        &self,
        participant: &Participant,
        message: &FixEventMessage,
        new_points: f64,
    ) -> bugbash_core::Result<()> {
        let event = ScoreEvent::new(participant, message, new_points);

        sqlx::query(
            r#"
            INSERT INTO score_event (id, fk_participant, repo_owner, repo_name, pr, points, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.participant_id)
        .bind(&event.repo_owner)
        .bind(&event.repo_name)
        .bind(event.pull_request_id)
        .bind(event.points)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn update_participant_score(
        &self,
        participant: &Participant,
        delta: f64,
    ) -> bugbash_core::Result<()> {
        let result = sqlx::query("UPDATE participant SET score = score + $2 WHERE id = $1")
            .bind(participant.id)
            .bind(delta)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        if result.rows_affected() != 1 {
            return Err(BugBashError::store(format!(
                "updating score of participant {} affected {} rows",
                participant.id,
                result.rows_affected()
            )));
        }

        Ok(())
    }
}

// ============================================
// Poll cursor
// ============================================

#[async_trait]
impl PollCursorStore for Database {
    async fn select_poll_cursor(&self, id: &str) -> bugbash_core::Result<PollCursor> {
        let row = sqlx::query_as::<_, PollRow>(
            "SELECT id, last_polled, last_record_id, last_poll_completed FROM poll WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(PollCursor::from).unwrap_or_else(|| PollCursor::new(id)))
    }

    async fn update_poll_cursor(&self, cursor: &PollCursor) -> bugbash_core::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO poll (id, last_polled, last_record_id, last_poll_completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET last_polled = EXCLUDED.last_polled,
                last_record_id = EXCLUDED.last_record_id,
                last_poll_completed = COALESCE(EXCLUDED.last_poll_completed, poll.last_poll_completed)
            "#,
        )
        .bind(&cursor.id)
        .bind(cursor.last_polled)
        .bind(cursor.last_record_id)
        .bind(cursor.last_poll_completed)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}

// ============================================
// Fix event source
// ============================================

#[async_trait]
impl FixEventSource for Database {
    async fn fetch_after(&self, cursor: &PollCursor) -> bugbash_core::Result<Vec<FixEventRecord>> {
        let rows = sqlx::query_as::<_, FixEventLogRow>(
            r#"
            SELECT id, received_at, payload
            FROM fix_event_log
            WHERE (received_at, id) > ($1, $2)
              AND received_at <= clock_timestamp() - ($3 * interval '1 millisecond')
            ORDER BY received_at, id
            "#,
        )
        .bind(cursor.last_polled)
        .bind(cursor.last_record_id)
        .bind(self.fetch_settle.as_millis() as f64)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(FixEventRecord::from).collect())
    }
}

// ============================================
// Leaderboard
// ============================================

#[async_trait]
impl ParticipantDirectory for Database {
    async fn list_participants(&self, campaign: &str) -> bugbash_core::Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT p.id, c.campaign_name, s.scp_name, p.login_name, p.email, p.display_name,
                   p.team_name, p.score, p.joined_at
            FROM participant p
            JOIN campaign c ON c.id = p.fk_campaign
            JOIN source_control_provider s ON s.id = p.fk_scp
            WHERE c.campaign_name = $1
            ORDER BY p.score DESC, p.login_name
            "#,
        )
        .bind(campaign)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }
}
