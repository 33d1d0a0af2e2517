//! Enterprise event-forwarding endpoint.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Extension, State};
use axum::routing::post;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Enterprise route group.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/enterprise/siem", post(forward_events))
}

/// Request payload for `POST /api/enterprise/siem`.
#[derive(Debug, Deserialize)]
pub struct SiemRequest {
    /// Downstream platform identifier.
    #[serde(default)]
    pub platform: Option<String>,
    /// Ordered batch of opaque event records.
    #[serde(default)]
    pub events: Option<Vec<Value>>,
}

/// Success envelope for event forwarding.
#[derive(Debug, Serialize)]
pub struct SiemResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation naming the platform.
    pub message: String,
    /// Count of events accepted for forwarding.
    pub events_processed: usize,
    /// Request correlation identifier.
    pub request_id: String,
}

/// `POST /api/enterprise/siem`
async fn forward_events(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    axum::Json(request): axum::Json<SiemRequest>,
) -> ApiResult<axum::Json<SiemResponse>> {
    let platform = request.platform.as_deref().unwrap_or("unknown");
    let events = request.events.unwrap_or_default();

    let events_processed = state
        .forwarder
        .forward(platform, &events)
        .await
        .map_err(|err| ApiError::from_error(&ctx, "failed to forward events", &err))?;

    Ok(axum::Json(SiemResponse {
        success: true,
        message: format!("events sent to {platform}"),
        events_processed,
        request_id: ctx.request_id,
    }))
}
