//! Organization baseline endpoint.
//!
//! Baseline lookup is a stub: it returns a fixed profile until the
//! organization policy store exists.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Extension, Path};
use axum::routing::get;
use serde::Serialize;
use serde_json::{Value, json};

use crate::context::RequestContext;
use crate::server::AppState;

/// Organization route group.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/organization/baseline/:profile_type",
        get(get_baseline),
    )
}

/// Success envelope for baseline lookups.
#[derive(Debug, Serialize)]
pub struct BaselineResponse {
    /// Always `true`.
    pub success: bool,
    /// The baseline payload.
    pub data: Value,
    /// Request correlation identifier.
    pub request_id: String,
}

/// `GET /api/organization/baseline/:profile_type`
async fn get_baseline(
    Extension(ctx): Extension<RequestContext>,
    Path(profile_type): Path<String>,
) -> axum::Json<BaselineResponse> {
    let data = json!({
        "profile": profile_type,
        "baseline": {
            "controls": [
                { "id": "AC-2", "required": true, "level": "moderate" },
                { "id": "SI-3", "required": true, "level": "high" }
            ],
            "policies": [],
            "customizations": []
        }
    });

    axum::Json(BaselineResponse {
        success: true,
        data,
        request_id: ctx.request_id,
    })
}
