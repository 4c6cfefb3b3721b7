// Campaign and organization domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Campaign - a time-boxed contest with its own roster and point values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub start_on: DateTime<Utc>,
    pub end_on: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Campaign {
    pub fn new(name: impl Into<String>, start_on: DateTime<Utc>, end_on: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            start_on,
            end_on,
            created_on: Utc::now(),
            note: None,
        }
    }

    /// Active window is inclusive at both ends
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_on <= now && now <= self.end_on
    }
}

/// Organization - (source control provider, organization) pair tracked for scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Organization {
    pub id: Uuid,
    pub scp_name: String,
    pub organization: String,
}

impl Organization {
    pub fn new(scp_name: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            scp_name: scp_name.into(),
            organization: organization.into(),
        }
    }

    /// Provider names match exactly, organization names ignore ASCII case
    pub fn matches(&self, event_source: &str, repo_owner: &str) -> bool {
        self.scp_name == event_source && self.organization.eq_ignore_ascii_case(repo_owner)
    }
}
