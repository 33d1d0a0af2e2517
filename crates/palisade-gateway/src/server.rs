//! Gateway server assembly.
//!
//! Builds the application state, router, and middleware stack, and serves
//! HTTP. The refresh scheduler is spawned alongside the server so catalog
//! snapshots stay fresh without request traffic.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Extension;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use palisade_core::Result;
use palisade_core::storage::{MemoryBackend, StorageBackend};

use crate::catalog::{BuiltinCatalog, CatalogFetcher, CatalogSource};
use crate::config::{Config, CorsConfig};
use crate::context::{RequestContext, context_middleware};
use crate::error::ApiError;
use crate::forwarder::EventForwarder;
use crate::routes;
use crate::scheduler::RefreshScheduler;
use crate::submissions::SubmissionIngestor;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
    /// Gateway version.
    pub version: String,
    /// Gateway name.
    pub server: String,
    /// Request correlation identifier.
    pub request_id: String,
}

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Config,
    /// Cache-backed catalog fetcher.
    pub catalog: CatalogFetcher,
    /// Submission ingestor.
    pub ingestor: SubmissionIngestor,
    /// Enterprise event forwarder.
    pub forwarder: EventForwarder,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("ingestor", &self.ingestor)
            .field("forwarder", &self.forwarder)
            .finish()
    }
}

/// Health check endpoint handler.
///
/// A shallow liveness check; it does not verify storage or upstream
/// dependencies.
async fn health(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        server: "palisade-gateway".to_string(),
        request_id: ctx.request_id,
    })
}

/// Fallback handler for unmatched routes.
async fn not_found(ctx: Option<Extension<RequestContext>>) -> ApiError {
    let request_id = ctx.map_or_else(
        || ulid::Ulid::new().to_string(),
        |Extension(ctx)| ctx.request_id,
    );
    ApiError::endpoint_not_found(request_id)
}

/// The Palisade gateway server.
pub struct Server {
    config: Config,
    cache_store: Arc<dyn StorageBackend>,
    submission_store: Arc<dyn StorageBackend>,
    source: Arc<dyn CatalogSource>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("cache_store", &"<StorageBackend>")
            .field("submission_store", &"<StorageBackend>")
            .field("source", &"<CatalogSource>")
            .finish()
    }
}

impl Server {
    /// Creates a server with in-memory storage and the placeholder catalog.
    ///
    /// Intended for tests and local experiments; use [`Server::with_stores`]
    /// for production.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_stores(
            config,
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryBackend::new()),
        )
    }

    /// Creates a server with explicit cache and submission stores.
    #[must_use]
    pub fn with_stores(
        config: Config,
        cache_store: Arc<dyn StorageBackend>,
        submission_store: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            config,
            cache_store,
            submission_store,
            source: Arc::new(BuiltinCatalog::new()),
        }
    }

    /// Replaces the catalog source (the seam for the real upstream client).
    #[must_use]
    pub fn with_catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.source = source;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn build_state(&self) -> Arc<AppState> {
        let catalog = CatalogFetcher::new(
            Arc::clone(&self.source),
            Arc::clone(&self.cache_store),
            self.config.fetch_timeout,
        );
        Arc::new(AppState {
            config: self.config.clone(),
            catalog,
            ingestor: SubmissionIngestor::new(Arc::clone(&self.submission_store)),
            forwarder: EventForwarder::new(),
        })
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self, state: Arc<AppState>) -> Router {
        let cors = Self::build_cors_layer(&self.config.cors);

        Router::new()
            .route("/health", get(health))
            .merge(routes::api_routes())
            .fallback(not_found)
            .layer(middleware::from_fn(context_middleware))
            // The last layer added is outermost: CORS wraps tracing wraps
            // the request-context middleware.
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state)
    }

    fn build_cors_layer(cors_config: &CorsConfig) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([header::HeaderName::from_static("x-request-id")])
            .max_age(Duration::from_secs(cors_config.max_age_seconds));

        Self::apply_cors_allowed_origins(cors, cors_config)
    }

    fn apply_cors_allowed_origins(cors: CorsLayer, cors_config: &CorsConfig) -> CorsLayer {
        if cors_config.allowed_origins.is_empty() {
            return cors;
        }

        let allows_any = cors_config.allowed_origins.len() == 1
            && cors_config
                .allowed_origins
                .first()
                .is_some_and(|origin| origin == "*");
        if allows_any {
            return cors.allow_origin(Any);
        }

        let mut allowed = Vec::new();
        for origin in &cors_config.allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => allowed.push(value),
                Err(_) => {
                    tracing::error!(
                        origin = %origin,
                        "invalid CORS origin; expected a valid HeaderValue"
                    );
                }
            }
        }

        if allowed.is_empty() {
            tracing::warn!("all configured CORS origins were invalid; disabling CORS");
            cors
        } else {
            tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// Spawns the unattended catalog refresh loop alongside the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the listener
    /// cannot bind.
    pub async fn serve(&self) -> Result<()> {
        self.config.validate()?;

        let state = self.build_state();
        let router = self.create_router(Arc::clone(&state));

        let scheduler =
            RefreshScheduler::new(state.catalog.clone(), self.config.refresh_interval);
        let refresh_task = scheduler.spawn();

        let addr = SocketAddr::new(self.config.http_host, self.config.http_port);
        tracing::info!(
            host = %self.config.http_host,
            port = self.config.http_port,
            debug = self.config.debug,
            "starting Palisade gateway"
        );

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            palisade_core::Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            }
        })?;

        let result = axum::serve(listener, router)
            .await
            .map_err(|e| palisade_core::Error::Internal {
                message: format!("server error: {e}"),
            });

        refresh_task.abort();
        result
    }

    /// Creates a test router for the server.
    ///
    /// Useful for integration tests exercising the routes without binding a
    /// port. The refresh scheduler is not spawned.
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router(self.build_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn router_creation_succeeds() {
        let server = Server::new(Config::default());
        let _router = server.test_router();
    }

    #[tokio::test]
    async fn health_reports_version_and_request_id() {
        let server = Server::new(Config::default());
        let app = server.test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("X-Request-Id", "req-health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        let health: HealthResponse = serde_json::from_slice(&body).expect("json");
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(health.request_id, "req-health");
    }

    #[tokio::test]
    async fn unmatched_route_returns_not_found_envelope() {
        let server = Server::new(Config::default());
        let app = server.test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/this/path/does/not/exist")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        let envelope: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error"], "endpoint not found");
        assert!(envelope["request_id"].is_string());
    }
}
