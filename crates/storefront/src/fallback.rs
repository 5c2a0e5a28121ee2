//! Fallback handler for requests the route table does not claim.
//!
//! The state is chosen once from the deployment mode and never changes:
//!
//! - **Production**: `GET`/`HEAD` first try the client build root, then get
//!   the SPA entry document so client-side routing can take over. This holds
//!   for every path, including ones that look like file names, so deep links
//!   such as `/order/64f0c2/receipt.pdf` still load the application.
//!   Paths under `/api` get the same document, but keep the API cache policy.
//! - **Development**: only `/` answers, with a liveness message.
//!
//! Everything else becomes `AppError::NotFound`.

use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};

use proshop_core::is_api_path;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::middleware::error_boundary::requested_path;
use crate::middleware::CachePolicy;
use crate::static_files::{EntryDocument, StaticAssets, is_read};

/// Liveness text served at `/` in development.
pub const LIVENESS_MESSAGE: &str = "API is running....";

#[derive(Debug, Clone)]
pub enum Fallback {
    Production {
        assets: StaticAssets,
        document: EntryDocument,
    },
    Development,
}

impl Fallback {
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        if config.mode.is_production() {
            Self::Production {
                assets: StaticAssets::client_app(&config.client_build_dir),
                document: EntryDocument::new(config.client_index()),
            }
        } else {
            Self::Development
        }
    }

    /// Answer a request no route matched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when this state has nothing to serve.
    pub async fn respond(&self, request: Request) -> Result<Response, AppError> {
        if !is_read(request.method()) {
            return Err(AppError::NotFound(requested_path(&request)));
        }
        match self {
            Self::Development => {
                if request.uri().path() == "/" {
                    Ok(LIVENESS_MESSAGE.into_response())
                } else {
                    Err(AppError::NotFound(requested_path(&request)))
                }
            }
            Self::Production { assets, document } => {
                let api = is_api_path(request.uri().path());
                let (parts, _) = request.into_parts();
                let lookup = Request::from_parts(parts.clone(), Body::empty());
                let mut response = match assets.serve(lookup).await {
                    Err(AppError::NotFound(_)) => {
                        tracing::debug!(
                            root = %assets.root().display(),
                            document = %document.path().display(),
                            path = %parts.uri.path(),
                            "No build asset, serving entry document"
                        );
                        document
                            .serve(Request::from_parts(parts, Body::empty()))
                            .await?
                    }
                    served => served?,
                };
                if api {
                    CachePolicy::Api.apply(response.headers_mut());
                    response.extensions_mut().insert(CachePolicy::Api);
                }
                Ok(response)
            }
        }
    }
}
