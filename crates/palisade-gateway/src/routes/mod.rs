//! HTTP route groups for the gateway.

use std::sync::Arc;

use axum::Router;

use crate::server::AppState;

pub mod catalog;
pub mod compliance;
pub mod enterprise;
pub mod organization;

/// All `/api` routes.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(catalog::routes())
        .merge(compliance::routes())
        .merge(organization::routes())
        .merge(enterprise::routes())
}
