//! Cache policy stage.
//!
//! Every response is governed by exactly one [`CachePolicy`]. Static
//! delivery picks its policy at serve time and records it in the response
//! extensions; anything that arrives here without one is an API response.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

pub const API_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, private";
pub const UPLOADS_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// Signals that server timing information is withheld.
pub const X_SERVER_TIME: &str = "x-server-time";

/// Caching class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Private, never stored.
    Api,
    /// User uploads: never stored, not even by shared proxies.
    Uploads,
    /// Prebuilt client assets keep the file server's own semantics.
    ClientApp,
}

impl CachePolicy {
    pub fn apply(self, headers: &mut HeaderMap) {
        match self {
            Self::Api => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static(API_CACHE_CONTROL));
                headers.insert(X_SERVER_TIME, HeaderValue::from_static("false"));
            }
            Self::Uploads => {
                headers.insert(
                    CACHE_CONTROL,
                    HeaderValue::from_static(UPLOADS_CACHE_CONTROL),
                );
                headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            }
            Self::ClientApp => {}
        }
    }
}

/// Apply the API policy to responses that static delivery did not claim.
pub async fn cache_control_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if response.extensions().get::<CachePolicy>().is_none() {
        CachePolicy::Api.apply(response.headers_mut());
        response.extensions_mut().insert(CachePolicy::Api);
    }
    response
}
