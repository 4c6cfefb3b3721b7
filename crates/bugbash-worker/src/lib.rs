// Bug bash poll worker
//
// PollScheduler drives the scoring pipeline from the fix event log:
// read cursor, fetch newer records, score each one, advance the cursor.

pub mod config;
pub mod scheduler;

pub use config::PollerConfig;
pub use scheduler::{PollFailure, PollScheduler, PollerStatus, PollerSupervision};
