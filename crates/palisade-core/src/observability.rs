//! Observability infrastructure for Palisade.
//!
//! Structured logging with consistent spans. This module provides the
//! initialization helper and span constructors used across the gateway so
//! every component logs with the same fields.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `palisade_gateway=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for gateway operations with standard fields.
///
/// # Example
///
/// ```rust
/// use palisade_core::observability::gateway_span;
///
/// let span = gateway_span("fetch_frameworks", "frameworks");
/// let _guard = span.enter();
/// // ... do gateway operation
/// ```
#[must_use]
pub fn gateway_span(operation: &str, resource: &str) -> Span {
    tracing::info_span!(
        "gateway",
        op = operation,
        resource = resource,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty);
    }

    #[test]
    fn span_helper_creates_span() {
        let span = gateway_span("ingest_submission", "submission");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }
}
