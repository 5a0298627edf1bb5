//! HTTP error responses.
//!
//! Every error surfaces to callers as `{"error": <message>}` with the
//! matching status code; this envelope is part of the platform's wire
//! contract for dynamic endpoints and the workflow invocation API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use weave_runtime::RuntimeError;

/// Result type for HTTP handlers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for HTTP handlers in the server.
#[derive(Debug)]
#[must_use = "errors do nothing unless serialized"]
pub enum Error {
    /// 400 with an explanatory message.
    BadRequest(String),
    /// 404 with an explanatory message.
    NotFound(String),
    /// 500 with the underlying message.
    Internal(String),
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) | Self::Internal(message) => {
                message
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({"error": self.message()}))).into_response()
    }
}

impl From<RuntimeError> for Error {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::WorkflowNotFound(_) => Self::NotFound(error.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<weave_postgres::PgError> for Error {
    fn from(error: weave_postgres::PgError) -> Self {
        Self::Internal(error.to_string())
    }
}
