// Bug Bash Scoring Engine
//
// This crate provides a DB-agnostic implementation of the bug bash scoring
// flow (fix event → participants → classification points → score events).
//
// Key design decisions:
// - Uses traits (ScoringStore, PollCursorStore, FixEventSource) for pluggable backends
// - Classification trees are typed (Count | Nested | Malformed) instead of untyped maps
// - Malformed classification entries are non-fatal and reported alongside the totals
// - Score events record the absolute point total, the running score moves by deltas
// - No cross-participant atomicity: the first failed write aborts the rest of a message

// Domain entity types
pub mod campaign;
pub mod classification;
pub mod message;
pub mod participant;
pub mod poll;
pub mod score_event;

pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod scoring;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use campaign::{Campaign, Organization};
pub use classification::{ClassificationTree, ClassificationValue};
pub use error::{BugBashError, Result};
pub use message::FixEventMessage;
pub use participant::Participant;
pub use pipeline::{apply_fix_event, AppliedScore};
pub use poll::{FixEventRecord, PollCursor, AFTER_ALL_RECORDS, DEFAULT_POLL_CURSOR_ID};
pub use resolver::resolve_participants;
pub use score_event::ScoreEvent;
pub use scoring::{compute_score, tally_classifications, Tally, UNCLASSIFIED_FIX_BONUS};
pub use traits::{FixEventSource, ParticipantDirectory, PollCursorStore, ScoringStore};
