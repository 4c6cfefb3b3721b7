// Poll cursor and raw fix event records
//
// The cursor is the single piece of poller state that survives restarts.
// Records are what the fix event source hands to the poller before they are
// decoded into FixEventMessage values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::Result;
use crate::message::FixEventMessage;

/// Identity of the cursor row used when none is configured
pub const DEFAULT_POLL_CURSOR_ID: &str = "1";

/// Record id that places a watermark after every record sharing its timestamp
pub const AFTER_ALL_RECORDS: i64 = i64::MAX;

/// PollCursor - watermark of the most recent processed fix event record
///
/// The position is the `(last_polled, last_record_id)` pair, so records that
/// share a `received_at` are still totally ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PollCursor {
    pub id: String,
    pub last_polled: DateTime<Utc>,
    #[serde(default)]
    pub last_record_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_poll_completed: Option<DateTime<Utc>>,
}

impl PollCursor {
    /// Cursor that has never polled: everything is newer than it
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_polled: DateTime::<Utc>::default(),
            last_record_id: 0,
            last_poll_completed: None,
        }
    }

    pub fn position(&self) -> (DateTime<Utc>, i64) {
        (self.last_polled, self.last_record_id)
    }

    /// Move the watermark past `record`; never moves it backwards
    pub fn advance_to(&mut self, record: &FixEventRecord) {
        if record.position() > self.position() {
            self.last_polled = record.received_at;
            self.last_record_id = record.id;
        }
    }

    /// Place the watermark after every record received at or before `last_polled`
    pub fn override_to(&mut self, last_polled: DateTime<Utc>) {
        self.last_polled = last_polled;
        self.last_record_id = AFTER_ALL_RECORDS;
    }
}

/// FixEventRecord - one unprocessed record as delivered by the event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixEventRecord {
    pub id: i64,
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl FixEventRecord {
    pub fn position(&self) -> (DateTime<Utc>, i64) {
        (self.received_at, self.id)
    }

    /// Whether this record sorts strictly after the cursor
    pub fn is_after(&self, cursor: &PollCursor) -> bool {
        self.position() > cursor.position()
    }

    /// Decode the payload into a fix event message
    pub fn parse(&self) -> Result<FixEventMessage> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}
