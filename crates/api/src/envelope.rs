//! Uniform response envelope shared by every endpoint.

use axum::Json;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Body wrapper: `{success, status, message, data, timestamp}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub status: u16,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    /// Wraps `data` in a success envelope for the given status code.
    pub fn ok(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: status.is_success(),
                status: status.as_u16(),
                message: message.to_string(),
                data,
                timestamp: Utc::now(),
            }),
        )
    }
}
