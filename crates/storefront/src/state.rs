//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;

use crate::config::StorefrontConfig;
use crate::fallback::Fallback;
use crate::middleware::HeaderPolicy;
use crate::static_files::StaticAssets;

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid header policy: {0}")]
    HeaderPolicy(#[from] InvalidHeaderValue),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything in here is derived from
/// configuration once at startup and is read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    header_policy: HeaderPolicy,
    uploads: StaticAssets,
    fallback: Fallback,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured payment origin cannot be placed in
    /// a `Content-Security-Policy` header.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let header_policy = HeaderPolicy::new(&config.payment_origin)?;
        let uploads = StaticAssets::uploads(&config.uploads_dir);
        let fallback = Fallback::from_config(&config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                header_policy,
                uploads,
                fallback,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The compiled response header policy.
    #[must_use]
    pub fn header_policy(&self) -> &HeaderPolicy {
        &self.inner.header_policy
    }

    /// The `/uploads` root.
    #[must_use]
    pub fn uploads(&self) -> &StaticAssets {
        &self.inner.uploads
    }

    #[must_use]
    pub fn fallback(&self) -> &Fallback {
        &self.inner.fallback
    }
}
