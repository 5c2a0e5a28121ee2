//! Static asset delivery.
//!
//! Two independent roots exist: user uploads (always mounted at `/uploads`)
//! and the prebuilt client application (production only). Each root carries
//! its own [`CachePolicy`], applied to the response at serve time and
//! recorded in the response extensions so the cache stage leaves it alone.
//!
//! Path resolution is delegated to `tower_http::services::ServeDir`, which
//! rejects `..`, absolute and drive-prefixed components; anything that does
//! not resolve to a file under the root is reported as not found.

use std::path::{Path, PathBuf};

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::AppError;
use crate::middleware::CachePolicy;
use crate::middleware::error_boundary::requested_path;

/// A directory served with a fixed cache policy.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
    dir: ServeDir,
    policy: CachePolicy,
}

impl StaticAssets {
    /// User uploads: no directory indexes, strict no-cache headers.
    pub fn uploads(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = ServeDir::new(&root).append_index_html_on_directories(false);
        Self {
            root,
            dir,
            policy: CachePolicy::Uploads,
        }
    }

    /// The prebuilt client application.
    pub fn client_app(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = ServeDir::new(&root);
        Self {
            root,
            dir,
            policy: CachePolicy::ClientApp,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stream the file `request` names under this root.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for non-`GET`/`HEAD` requests and paths
    /// that do not resolve to a file under the root.
    pub async fn serve(&self, request: Request) -> Result<Response, AppError> {
        let path = requested_path(&request);
        if !is_read(request.method()) {
            return Err(AppError::NotFound(path));
        }

        let Ok(response) = self.dir.clone().oneshot(request).await;
        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(path)),
            status if status.is_server_error() => {
                tracing::error!(root = %self.root.display(), %path, %status, "Static file read failed");
                Err(AppError::Internal(format!("failed to read {path}")))
            }
            _ => Ok(self.finish(response.into_response())),
        }
    }

    /// Apply this root's serve-time hook.
    fn finish(&self, mut response: Response) -> Response {
        self.policy.apply(response.headers_mut());
        response.extensions_mut().insert(self.policy);
        response
    }
}

/// The single-page application's entry document.
#[derive(Debug, Clone)]
pub struct EntryDocument {
    path: PathBuf,
    file: ServeFile,
}

impl EntryDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = ServeFile::new(&path);
        Self { path, file }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serve the document whatever path `request` named.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the document is missing on disk.
    pub async fn serve(&self, request: Request) -> Result<Response, AppError> {
        let path = requested_path(&request);
        let Ok(response) = self.file.clone().oneshot(request).await;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(document = %self.path.display(), "Entry document missing");
            return Err(AppError::NotFound(path));
        }
        let mut response = response.into_response();
        CachePolicy::ClientApp.apply(response.headers_mut());
        response.extensions_mut().insert(CachePolicy::ClientApp);
        Ok(response)
    }
}

pub(crate) fn is_read(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}
