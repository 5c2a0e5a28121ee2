//! Origin policy stage.
//!
//! Exactly one origin receives permissive, credentialed CORS headers.
//! Requests from any other origin are not rejected here; they simply get
//! headers naming the configured origin, and the browser enforces the rest.
//! Same-origin requests (no `Origin` header) pass through untouched.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Build the CORS layer for `origin`.
#[must_use]
pub fn origin_policy_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
