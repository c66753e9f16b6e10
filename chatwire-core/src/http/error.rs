//! HTTP error mapping utilities

use crate::error::ChatError;
use crate::protocol::types::ErrorBody;
use reqwest::StatusCode;
use uuid::Uuid;

/// Map a non-success status and its body to `RequestFailed`.
///
/// The message comes from the `{error, details?}` body when it parses, and
/// is otherwise derived from the numeric status.
pub fn map_http_error(status: StatusCode, body: Option<&str>, request_id: Uuid) -> ChatError {
    let parsed = body.and_then(|b| serde_json::from_str::<ErrorBody>(b).ok());

    match parsed {
        Some(ErrorBody { error, details }) => {
            tracing::debug!(
                "Server error body [request_id: {}]: {} ({:?})",
                request_id,
                error,
                details
            );
            ChatError::RequestFailed {
                status: status.as_u16(),
                message: error,
                details,
            }
        }
        None => ChatError::RequestFailed {
            status: status.as_u16(),
            message: status_message(status),
            details: None,
        },
    }
}

/// Fallback message for a status without a usable error body
pub fn status_message(status: StatusCode) -> String {
    format!("HTTP {}", status.as_u16())
}
