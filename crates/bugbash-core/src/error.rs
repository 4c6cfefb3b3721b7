// Error types for the scoring engine

use thiserror::Error;

/// Result type alias for scoring operations
pub type Result<T> = std::result::Result<T, BugBashError>;

/// Errors that can occur while scoring fix events or driving the poller
#[derive(Debug, Error)]
pub enum BugBashError {
    /// Persistent store failure (connectivity or query)
    #[error("Store error: {0}")]
    Store(String),

    /// Classification entry that is neither a count nor a nested mapping
    #[error("Malformed classification entry '{label}': expected number or object, found {found}")]
    MalformedClassification { label: String, found: &'static str },

    /// Fix event record whose payload could not be decoded
    #[error("Invalid fix event: {0}")]
    InvalidFixEvent(String),

    /// Poller start requested while a worker is already running
    #[error("Poller is already running")]
    PollerAlreadyRunning,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BugBashError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        BugBashError::Store(msg.into())
    }

    /// Create an invalid fix event error
    pub fn invalid_fix_event(msg: impl Into<String>) -> Self {
        BugBashError::InvalidFixEvent(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        BugBashError::Configuration(msg.into())
    }

    /// Whether this error leaves already-accumulated totals valid
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, BugBashError::MalformedClassification { .. })
    }
}

impl From<serde_json::Error> for BugBashError {
    fn from(err: serde_json::Error) -> Self {
        BugBashError::InvalidFixEvent(err.to_string())
    }
}
