//! # HTTP Handlers
//!
//! One module per route group. Each exposes `routes()` returning a
//! router over the shared [`AppState`](crate::AppState).
//!
//! ## Response Envelope
//! ```text
//! success:  { "success": true,  "message"?: "...", "data"?: ... }
//! failure:  { "success": false, "code": "NOT_FOUND", "message": "..." }
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod reports;
pub mod sales;

use axum::Json;
use serde::Serialize;

/// Successful JSON body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

/// Id of a newly created row.
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}
