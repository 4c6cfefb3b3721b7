// In-memory implementations for testing
//
// A single store backs every trait so the scoring pipeline, the poll
// scheduler and the leaderboard can be exercised without Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::campaign::{Campaign, Organization};
use crate::error::{BugBashError, Result};
use crate::message::FixEventMessage;
use crate::participant::Participant;
use crate::poll::{FixEventRecord, PollCursor};
use crate::score_event::ScoreEvent;
use crate::traits::{FixEventSource, ParticipantDirectory, PollCursorStore, ScoringStore};

// ============================================================================
// InMemoryStore - campaigns, participants, score events, records, cursors
// ============================================================================

#[derive(Debug, Default)]
struct State {
    organizations: Vec<Organization>,
    campaigns: HashMap<String, Campaign>,
    participants: Vec<Participant>,
    point_values: HashMap<(String, String), f64>,
    score_events: Vec<ScoreEvent>,
    records: Vec<FixEventRecord>,
    cursors: HashMap<String, PollCursor>,
    fetch_log: Vec<DateTime<Utc>>,
    organization_error: Option<String>,
    fetch_error: Option<String>,
}

/// In-memory store implementing every bug bash store trait
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    default_point_value: f64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point value used for labels with no configured value (0.0 unless set)
    pub fn with_default_point_value(mut self, value: f64) -> Self {
        self.default_point_value = value;
        self
    }

    pub async fn add_organization(&self, organization: Organization) {
        self.state.write().await.organizations.push(organization);
    }

    pub async fn add_campaign(&self, campaign: Campaign) {
        self.state
            .write()
            .await
            .campaigns
            .insert(campaign.name.clone(), campaign);
    }

    pub async fn add_participant(&self, participant: Participant) {
        self.state.write().await.participants.push(participant);
    }

    /// Configure the points one fix of `label` is worth in `campaign`
    pub async fn set_point_value(&self, campaign: &str, label: &str, value: f64) {
        self.state
            .write()
            .await
            .point_values
            .insert((campaign.to_string(), label.to_string()), value);
    }

    /// Append a raw record to the event log, returning it with its assigned id
    pub async fn push_record(
        &self,
        received_at: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> FixEventRecord {
        let mut state = self.state.write().await;
        let record = FixEventRecord {
            id: state.records.len() as i64 + 1,
            received_at,
            payload,
        };
        state.records.push(record.clone());
        record
    }

    /// Make every organization check fail with a store error
    pub async fn fail_organization_check(&self, msg: impl Into<String>) {
        self.state.write().await.organization_error = Some(msg.into());
    }

    /// Make record fetches fail with a store error until cleared with `None`
    pub async fn fail_fetch(&self, msg: Option<String>) {
        self.state.write().await.fetch_error = msg;
    }

    pub async fn participant(&self, id: Uuid) -> Option<Participant> {
        self.state
            .read()
            .await
            .participants
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn score_events(&self) -> Vec<ScoreEvent> {
        self.state.read().await.score_events.clone()
    }

    /// Cursor timestamps passed to `fetch_after`, in call order
    pub async fn fetch_log(&self) -> Vec<DateTime<Utc>> {
        self.state.read().await.fetch_log.clone()
    }

    pub async fn poll_cursor(&self, id: &str) -> Option<PollCursor> {
        self.state.read().await.cursors.get(id).cloned()
    }
}

#[async_trait]
impl ScoringStore for InMemoryStore {
    async fn is_organization_valid(&self, event_source: &str, repo_owner: &str) -> Result<bool> {
        let state = self.state.read().await;
        if let Some(msg) = &state.organization_error {
            return Err(BugBashError::store(msg.clone()));
        }
        Ok(state
            .organizations
            .iter()
            .any(|org| org.matches(event_source, repo_owner)))
    }

    async fn select_participants_to_score(
        &self,
        message: &FixEventMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.scp_name == message.event_source && p.is_login(&message.trigger_user))
            .filter(|p| {
                state
                    .campaigns
                    .get(&p.campaign_name)
                    .is_some_and(|c| c.is_active_at(now))
            })
            .cloned()
            .collect())
    }

    async fn select_point_value(&self, _message: &FixEventMessage, campaign: &str, label: &str) -> f64 {
        self.state
            .read()
            .await
            .point_values
            .get(&(campaign.to_string(), label.to_string()))
            .copied()
            .unwrap_or(self.default_point_value)
    }

    async fn select_prior_score(&self, participant: &Participant, message: &FixEventMessage) -> f64 {
        self.state
            .read()
            .await
            .score_events
            .iter()
            .rev()
            .find(|e| e.supersedes_for(participant, message))
            .map(|e| e.points)
            .unwrap_or(0.0)
    }

    async fn insert_score_event(
        &self,
        participant: &Participant,
        message: &FixEventMessage,
        new_points: f64,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .score_events
            .push(ScoreEvent::new(participant, message, new_points));
        Ok(())
    }

    async fn update_participant_score(&self, participant: &Participant, delta: f64) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
            .ok_or_else(|| BugBashError::store(format!("participant {} not found", participant.id)))?;
        stored.score += delta;
        Ok(())
    }
}

#[async_trait]
impl PollCursorStore for InMemoryStore {
    async fn select_poll_cursor(&self, id: &str) -> Result<PollCursor> {
        Ok(self
            .state
            .read()
            .await
            .cursors
            .get(id)
            .cloned()
            .unwrap_or_else(|| PollCursor::new(id)))
    }

    async fn update_poll_cursor(&self, cursor: &PollCursor) -> Result<()> {
        self.state
            .write()
            .await
            .cursors
            .insert(cursor.id.clone(), cursor.clone());
        Ok(())
    }
}

#[async_trait]
impl FixEventSource for InMemoryStore {
    async fn fetch_after(&self, cursor: &PollCursor) -> Result<Vec<FixEventRecord>> {
        let mut state = self.state.write().await;
        state.fetch_log.push(cursor.last_polled);
        if let Some(msg) = &state.fetch_error {
            return Err(BugBashError::store(msg.clone()));
        }

        let mut records: Vec<FixEventRecord> = state
            .records
            .iter()
            .filter(|r| r.is_after(cursor))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.received_at, r.id));
        Ok(records)
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryStore {
    async fn list_participants(&self, campaign: &str) -> Result<Vec<Participant>> {
        let mut participants: Vec<Participant> = self
            .state
            .read()
            .await
            .participants
            .iter()
            .filter(|p| p.campaign_name == campaign)
            .cloned()
            .collect();
        participants.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_after_is_strictly_newer_and_ordered() {
        let store = InMemoryStore::new();
        let base = Utc::now();
        store.push_record(base + Duration::seconds(2), json!({})).await;
        store.push_record(base, json!({})).await;
        store.push_record(base + Duration::seconds(1), json!({})).await;

        let mut cursor = PollCursor::new("1");
        cursor.override_to(base);
        let records = store.fetch_after(&cursor).await.unwrap();

        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(store.fetch_log().await, vec![base]);
    }

    #[tokio::test]
    async fn test_fetch_after_resumes_within_shared_timestamp() {
        let store = InMemoryStore::new();
        let at = Utc::now();
        let first = store.push_record(at, json!({})).await;
        store.push_record(at, json!({})).await;
        store.push_record(at, json!({})).await;

        let mut cursor = PollCursor::new("1");
        cursor.advance_to(&first);
        let records = store.fetch_after(&cursor).await.unwrap();

        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_missing_cursor_starts_at_epoch() {
        let store = InMemoryStore::new();

        let cursor = store.select_poll_cursor("1").await.unwrap();
        assert_eq!(cursor.last_polled, DateTime::<Utc>::default());
        assert!(store.poll_cursor("1").await.is_none());
    }

    #[tokio::test]
    async fn test_leaderboard_sorted_by_score() {
        let store = InMemoryStore::new();
        let mut low = Participant::new("spring", "GitHub", "low");
        low.score = 1.0;
        let mut high = Participant::new("spring", "GitHub", "high");
        high.score = 9.0;
        store.add_participant(low).await;
        store.add_participant(high).await;
        store
            .add_participant(Participant::new("autumn", "GitHub", "other"))
            .await;

        let board = store.list_participants("spring").await.unwrap();
        let logins: Vec<&str> = board.iter().map(|p| p.login_name.as_str()).collect();
        assert_eq!(logins, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn test_update_unknown_participant_fails() {
        let store = InMemoryStore::new();
        let ghost = Participant::new("spring", "GitHub", "ghost");

        let err = store.update_participant_score(&ghost, 1.0).await.unwrap_err();
        assert!(matches!(err, BugBashError::Store(_)));
    }
}
