// Fix event message
//
// Immutable description of one externally reported fix event. Produced by
// ingestion and consumed read-only by the scoring engine.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::classification::ClassificationTree;

/// Pull request id used for events that did not come from a pull request
pub const NO_PULL_REQUEST: i64 = -1;

fn no_pull_request() -> i64 {
    NO_PULL_REQUEST
}

/// FixEventMessage - one reported fix event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FixEventMessage {
    /// Source control provider the event came from (e.g. "GitHub")
    pub event_source: String,
    #[serde(rename = "repositoryOwner")]
    pub repo_owner: String,
    #[serde(rename = "repositoryName", default)]
    pub repo_name: String,
    #[serde(default = "no_pull_request")]
    pub pull_request_id: i64,
    /// Login of the user who triggered the event, matched case-insensitively
    pub trigger_user: String,
    /// Fixes with no specific classification
    #[serde(default)]
    pub total_fixed: i64,
    #[serde(
        rename = "fixed-bug-types",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub classification_counts: Option<ClassificationTree>,
}

impl Default for FixEventMessage {
    fn default() -> Self {
        Self {
            event_source: String::new(),
            repo_owner: String::new(),
            repo_name: String::new(),
            pull_request_id: NO_PULL_REQUEST,
            trigger_user: String::new(),
            total_fixed: 0,
            classification_counts: None,
        }
    }
}

impl FixEventMessage {
    /// Copy of this message with the trigger user and repository owner lowercased
    ///
    /// Organizations match case-insensitively, so the owner is folded too and
    /// the same change always keys to one prior score.
    pub fn normalized(&self) -> Self {
        Self {
            trigger_user: self.trigger_user.to_lowercase(),
            repo_owner: self.repo_owner.to_lowercase(),
            ..self.clone()
        }
    }
}
