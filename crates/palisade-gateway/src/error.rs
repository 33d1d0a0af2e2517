//! Gateway error responses.
//!
//! All component failures raised inside a handler are caught at the handler
//! boundary, logged server-side with the request-correlation identifier and
//! full error detail, and converted to a generic user-facing failure
//! envelope. Internal error text never crosses the boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use palisade_core::Error as CoreError;

use crate::context::RequestContext;

/// The failure envelope returned for every handler error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Generic user-facing message; internal detail stays in server logs.
    pub error: String,
    /// Request correlation identifier.
    pub request_id: String,
}

/// A handler-boundary error carrying the generic message and status to
/// return to the caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    request_id: String,
}

impl ApiError {
    /// Wraps a component failure: logs the full detail server-side and keeps
    /// only the generic `user_message` for the response envelope.
    #[must_use]
    pub fn from_error(ctx: &RequestContext, user_message: &str, err: &CoreError) -> Self {
        tracing::error!(
            request_id = %ctx.request_id,
            error = %err,
            "{user_message}"
        );
        let status = match err {
            CoreError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: user_message.to_string(),
            request_id: ctx.request_id.clone(),
        }
    }

    /// Builds the not-found envelope for unmatched routes.
    #[must_use]
    pub fn endpoint_not_found(request_id: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "endpoint not found".to_string(),
            request_id,
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            success: false,
            error: self.error,
            request_id: self.request_id,
        };
        (self.status, axum::Json(envelope)).into_response()
    }
}

/// Result type for gateway handlers.
pub type ApiResult<T> = Result<T, ApiError>;
