//! Error responses
//!
//! Every failure is answered with `{"error": message, "kind": ..., "stage": ...}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use sift_core::search::ErrorKind;
use sift_core::{SearchError, StorageError};

/// An error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    stage: Option<String>,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let (status, kind) = if e.is_timeout() {
            (StatusCode::GATEWAY_TIMEOUT, "timeout")
        } else {
            match e.kind() {
                ErrorKind::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                ErrorKind::Encoding => (StatusCode::BAD_GATEWAY, "encoding"),
                ErrorKind::Storage => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
                ErrorKind::Initialization => (StatusCode::INTERNAL_SERVER_ERROR, "initialization"),
            }
        };

        Self {
            status,
            kind,
            stage: e.stage().map(|s| s.to_string()),
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // a body that does not parse is as invalid as one that fails validation
        let status = match rejection.status() {
            StatusCode::BAD_REQUEST => StatusCode::UNPROCESSABLE_ENTITY,
            other => other,
        };
        Self {
            status,
            kind: "validation",
            stage: None,
            message: rejection.body_text(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "storage",
            stage: None,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "kind": self.kind,
            "stage": self.stage,
        }));
        (self.status, body).into_response()
    }
}
