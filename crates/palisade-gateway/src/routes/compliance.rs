//! Compliance submission endpoint.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Extension, State};
use axum::routing::post;
use serde::Serialize;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::submissions::SubmissionRequest;

/// Compliance route group.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/compliance/submit", post(submit))
}

/// Success envelope for submissions.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Always `true`.
    pub success: bool,
    /// Gateway-generated report identifier.
    pub report_id: Uuid,
    /// Human-readable confirmation.
    pub message: String,
    /// Request correlation identifier.
    pub request_id: String,
}

/// `POST /api/compliance/submit`
async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> ApiResult<axum::Json<SubmitResponse>> {
    let report_id = state.ingestor.ingest(request).await.map_err(|err| {
        ApiError::from_error(&ctx, "failed to submit compliance results", &err)
    })?;

    Ok(axum::Json(SubmitResponse {
        success: true,
        report_id,
        message: "compliance results submitted successfully".to_string(),
        request_id: ctx.request_id,
    }))
}
