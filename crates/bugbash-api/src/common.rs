// Common DTOs and error mapping for the public API

use axum::{http::StatusCode, Json};
use bugbash_core::BugBashError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response wrapper for list endpoints.
/// All list endpoints return responses wrapped in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Array of items returned by the list operation.
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a core error to a status code, passing the message through verbatim
pub fn api_error(err: BugBashError) -> ApiError {
    let status = match &err {
        BugBashError::InvalidFixEvent(_) | BugBashError::MalformedClassification { .. } => {
            StatusCode::BAD_REQUEST
        }
        BugBashError::PollerAlreadyRunning => StatusCode::CONFLICT,
        BugBashError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        BugBashError::Configuration(_) | BugBashError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
