//! Request context extraction for gateway handlers.
//!
//! Every request carries an opaque correlation identifier: an inbound
//! `X-Request-Id` header is honored, otherwise one is minted. The identifier
//! is stashed in request extensions for handlers and echoed on every
//! response, including error and fallback responses.

use axum::body::Body;
use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context derived from headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation.
    pub request_id: String,
}

fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Request-Id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn add_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

/// Middleware that injects a request context and echoes the request ID.
pub async fn context_middleware(req: Request<Body>, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let request_id =
        request_id_from_headers(&parts.headers).unwrap_or_else(|| ulid::Ulid::new().to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "handling request"
    );

    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    parts.extensions.insert(ctx);

    let mut response = next.run(Request::from_parts(parts, body)).await;
    add_request_id_header(&mut response, &request_id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_request_id_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", HeaderValue::from_static("req-123"));
        assert_eq!(request_id_from_headers(&headers).as_deref(), Some("req-123"));
    }

    #[test]
    fn missing_request_id_yields_none() {
        assert!(request_id_from_headers(&HeaderMap::new()).is_none());
    }
}
