// Participant domain type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Participant - enrollment of one login in one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Participant {
    pub id: Uuid,
    pub campaign_name: String,
    pub scp_name: String,
    /// Login on the source control provider, matched case-insensitively
    pub login_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub score: f64,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        campaign_name: impl Into<String>,
        scp_name: impl Into<String>,
        login_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            campaign_name: campaign_name.into(),
            scp_name: scp_name.into(),
            login_name: login_name.into(),
            email: None,
            display_name: None,
            team_name: None,
            score: 0.0,
            joined_at: Utc::now(),
        }
    }

    /// Whether `login` refers to this participant, ignoring case
    pub fn is_login(&self, login: &str) -> bool {
        self.login_name.to_lowercase() == login.to_lowercase()
    }
}
