//! Catalog retrieval endpoints.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Extension, Path, State};
use axum::routing::get;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Catalog route group.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/nist/frameworks", get(list_frameworks))
        .route(
            "/api/nist/frameworks/:framework_id/controls",
            get(list_controls),
        )
}

/// Success envelope for catalog reads.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Always `true`.
    pub success: bool,
    /// The catalog payload, opaque to the gateway.
    pub data: Value,
    /// Request correlation identifier.
    pub request_id: String,
}

/// `GET /api/nist/frameworks`
async fn list_frameworks(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<axum::Json<CatalogResponse>> {
    let data = state
        .catalog
        .fetch_frameworks()
        .await
        .map_err(|err| ApiError::from_error(&ctx, "failed to fetch security frameworks", &err))?;

    Ok(axum::Json(CatalogResponse {
        success: true,
        data,
        request_id: ctx.request_id,
    }))
}

/// `GET /api/nist/frameworks/:framework_id/controls`
async fn list_controls(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(framework_id): Path<String>,
) -> ApiResult<axum::Json<CatalogResponse>> {
    let data = state
        .catalog
        .fetch_controls(&framework_id)
        .await
        .map_err(|err| ApiError::from_error(&ctx, "failed to fetch framework controls", &err))?;

    Ok(axum::Json(CatalogResponse {
        success: true,
        data,
        request_id: ctx.request_id,
    }))
}
