//! Optional per-request deadline.
//!
//! Disabled unless `REQUEST_TIMEOUT_SECS` is set. A request that overruns is
//! dropped and answered with `AppError::Timeout`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Bound request handling by the configured timeout, if any.
///
/// # Errors
///
/// Returns `AppError::Timeout` when the deadline passes first.
pub async fn timeout_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(limit) = state.config().request_timeout else {
        return Ok(next.run(request).await);
    };
    tokio::time::timeout(limit, next.run(request))
        .await
        .map_err(|_| {
            tracing::warn!(timeout_secs = limit.as_secs(), "Request timed out");
            AppError::Timeout
        })
}
