//! HTTP middleware stack for the storefront gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request span with `request_id` and `route`)
//! 3. Request ID (reuse inbound or mint a UUID)
//! 4. Header policy (CSP, referrer policy, identity header removal)
//! 5. Origin policy (single-origin credentialed CORS)
//! 6. Cache policy (API directive unless static delivery chose one)
//! 7. Error boundary (renders every failure as a JSON envelope)
//! 8. Timeout (only when configured)
//! 9. Body decoding (JSON, URL-encoded forms, cookies)
//! 10. Panic catcher
//!
//! Responses travel back through the list in reverse, so the error envelope is
//! final before the cache and header policies run, and both cover error
//! responses. Preflights are answered by the origin policy and so only pass
//! back through the header policy.

pub mod body_decoding;
pub mod cache_control;
pub mod cors;
pub mod error_boundary;
pub mod request_id;
pub mod security_headers;
pub mod timeout;

use axum::extract::Request;
use proshop_core::resolve;
use tracing::Span;

pub use body_decoding::{RequestContext, body_decoding_middleware};
pub use cache_control::{CachePolicy, cache_control_middleware};
pub use cors::origin_policy_layer;
pub use error_boundary::{error_boundary_middleware, not_found};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::{HeaderPolicy, security_headers_middleware};
pub use timeout::timeout_middleware;

/// Span for one request, for `TraceLayer::make_span_with`.
///
/// `request_id` is filled in later by the request ID stage.
#[must_use]
pub fn make_request_span(request: &Request) -> Span {
    let path = request.uri().path();
    let route = resolve(path).map_or("fallback", |route| route.prefix);
    tracing::info_span!(
        "request",
        method = %request.method(),
        path,
        route,
        request_id = tracing::field::Empty,
    )
}
