//! Error boundary, as two composable stages.
//!
//! 1. [`not_found`] synthesizes a 404 failure carrying the requested path when
//!    nothing handled the request.
//! 2. [`error_boundary_middleware`] renders every reported failure, including
//!    synthesized ones, as an [`ErrorEnvelope`].
//!
//! In production, failures that did not choose their own status are reported
//! as a bare `Server Error` and traces are never sent.

use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::{
        HeaderValue,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use proshop_core::{DeploymentMode, ErrorEnvelope};

use crate::error::{AppError, ErrorReport};
use crate::state::AppState;

/// Message substituted for internal failures in production.
pub const GENERIC_SERVER_ERROR: &str = "Server Error";

/// The path and query the client asked for, before any nesting stripped it.
#[must_use]
pub fn requested_path(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri(), |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

/// Stage one: nothing matched `uri`.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    AppError::NotFound(path)
}

/// Build the envelope for `report` under `mode`.
#[must_use]
pub fn envelope(report: &ErrorReport, mode: DeploymentMode) -> ErrorEnvelope {
    if mode.is_production() {
        let message = if report.explicit_status {
            report.message.clone()
        } else {
            GENERIC_SERVER_ERROR.to_string()
        };
        ErrorEnvelope {
            message,
            stack: None,
        }
    } else {
        ErrorEnvelope {
            message: report.message.clone(),
            stack: report.trace.clone(),
        }
    }
}

/// Stage two: render reported failures as JSON envelopes.
///
/// Status, headers and extensions of the failed response are preserved; only
/// the body is replaced.
pub async fn error_boundary_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let body = envelope(&report, state.config().mode);
    let (mut parts, _) = response.into_parts();
    let (rendered, rendered_body) = Json(body).into_response().into_parts();

    parts.status = report.status;
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.insert(
        CONTENT_TYPE,
        rendered
            .headers
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json")),
    );
    Response::from_parts(parts, rendered_body)
}
