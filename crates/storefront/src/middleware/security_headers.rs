//! Header policy stage: transport security headers on every response.
//!
//! The policy is compiled once at startup into [`HeaderPolicy`] and applied
//! unconditionally, whatever the request or the handler that answered it.
//! Applying it twice yields the same header set.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, InvalidHeaderValue, REFERRER_POLICY, SERVER,
            STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_DNS_PREFETCH_CONTROL,
            X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Framework identity header some upstream handlers still emit.
pub const X_POWERED_BY: &str = "x-powered-by";

/// Fixed headers that do not depend on configuration.
const STATIC_HEADERS: &[(&str, &str)] = &[
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
];

/// Security header policy, built once from configuration.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    content_security_policy: HeaderValue,
}

impl HeaderPolicy {
    /// Build the policy allowing `payment_origin` as the single third-party
    /// source for scripts, images, connections and frames.
    ///
    /// # Errors
    ///
    /// Returns an error if `payment_origin` cannot appear in a header value.
    pub fn new(payment_origin: &str) -> Result<Self, InvalidHeaderValue> {
        let csp = format!(
            "default-src 'self';\
             script-src 'self' 'unsafe-inline' 'unsafe-eval' {payment_origin};\
             style-src 'self' 'unsafe-inline';\
             img-src 'self' data: {payment_origin};\
             connect-src 'self' {payment_origin};\
             frame-src 'self' {payment_origin};\
             base-uri 'self';\
             font-src 'self' https: data:;\
             form-action 'self';\
             frame-ancestors 'self';\
             object-src 'none';\
             script-src-attr 'none';\
             upgrade-insecure-requests"
        );
        Ok(Self {
            content_security_policy: HeaderValue::from_str(&csp)?,
        })
    }

    #[must_use]
    pub const fn content_security_policy(&self) -> &HeaderValue {
        &self.content_security_policy
    }

    /// Set the policy headers and strip server identity headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            CONTENT_SECURITY_POLICY,
            self.content_security_policy.clone(),
        );

        // Never send a referrer
        headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        // Legacy XSS auditors do more harm than good
        headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("0"));

        for (name, value) in STATIC_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        headers.remove(SERVER);
        headers.remove(X_POWERED_BY);
    }
}

/// Apply the startup-built [`HeaderPolicy`] to every response.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    state.header_policy().apply(response.headers_mut());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy() -> HeaderPolicy {
        HeaderPolicy::new("*.paypal.com").unwrap()
    }

    #[test]
    fn test_csp_allows_payment_origin() {
        let csp = policy().content_security_policy().to_str().unwrap().to_owned();
        assert!(csp.starts_with("default-src 'self';"));
        assert!(csp.contains("script-src 'self' 'unsafe-inline' 'unsafe-eval' *.paypal.com;"));
        assert!(csp.contains("img-src 'self' data: *.paypal.com;"));
        assert!(csp.contains("connect-src 'self' *.paypal.com;"));
        assert!(csp.contains("frame-src 'self' *.paypal.com;"));
        assert!(csp.contains("style-src 'self' 'unsafe-inline';"));
        assert!(csp.contains("object-src 'none'"));
    }

    #[test]
    fn test_invalid_payment_origin() {
        assert!(HeaderPolicy::new("evil.example\r\nx-injected: 1").is_err());
    }

    #[test]
    fn test_apply_removes_identity_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx/1.25.3"));
        headers.insert(X_POWERED_BY, HeaderValue::from_static("Express"));

        policy().apply(&mut headers);

        assert!(headers.get(SERVER).is_none());
        assert!(headers.get(X_POWERED_BY).is_none());
        assert_eq!(headers.get(REFERRER_POLICY).unwrap(), "no-referrer");
        assert_eq!(headers.get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get("origin-agent-cluster").unwrap(), "?1");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let policy = policy();
        let mut once = HeaderMap::new();
        policy.apply(&mut once);
        let mut twice = once.clone();
        policy.apply(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(twice.get_all(CONTENT_SECURITY_POLICY).iter().count(), 1);
    }
}
