//! Success envelope shared by every endpoint.
//!
//! ```json
//! { "success": true, "data": { ... }, "meta": { ... } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A success payload plus the status it is sent with.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status,
            body: Envelope {
                success: true,
                data,
                meta: None,
            },
        }
    }

    /// Attaches a `meta` object. Values that fail to serialize are dropped.
    #[must_use]
    pub fn with_meta<M: Serialize>(mut self, meta: M) -> Self {
        self.body.meta = serde_json::to_value(meta).ok();
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
