// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - Database: implements ScoringStore, PollCursorStore, FixEventSource
//   and ParticipantDirectory against the schema in ./migrations

pub mod models;
pub mod repositories;

pub use models::*;
pub use repositories::*;
