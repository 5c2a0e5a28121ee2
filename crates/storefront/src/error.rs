//! Unified error handling with Sentry integration.
//!
//! Handlers and pipeline stages return `Result<T, AppError>`. Converting an
//! `AppError` into a response does not render a body: it attaches an
//! [`ErrorReport`] to the response extensions, and the error boundary stage
//! (see [`crate::middleware::error_boundary`]) turns that report into the JSON
//! envelope with the verbosity of the current deployment mode.

use std::any::Any;
use std::error::Error as _;
use std::fmt::Write as _;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::body::BodyError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// No route or file matched the requested path.
    #[error("Not Found - {0}")]
    NotFound(String),

    /// The body did not parse against its declared content type.
    #[error("{0}")]
    MalformedBody(#[from] BodyError),

    /// The body exceeded the configured limit.
    #[error("request entity too large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    /// A handler group failed with a status of its choosing.
    #[error("{message}")]
    Handler { status: StatusCode, message: String },

    /// The request did not complete within the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Failure raised by a handler group with an explicit status.
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
        }
    }

    /// The status this failure carries, if it chose one.
    #[must_use]
    pub const fn explicit_status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::PayloadTooLarge { .. } | Self::MalformedBody(BodyError::TooManyParameters) => {
                Some(StatusCode::PAYLOAD_TOO_LARGE)
            }
            Self::Handler { status, .. } => Some(*status),
            Self::Timeout => Some(StatusCode::REQUEST_TIMEOUT),
            Self::MalformedBody(_) | Self::Panic(_) | Self::Internal(_) => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.explicit_status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Technical trace for development responses.
    ///
    /// Not-found is a routing outcome rather than a fault, so it has none.
    #[must_use]
    pub fn trace(&self) -> Option<String> {
        if matches!(self, Self::NotFound(_)) {
            return None;
        }
        let mut trace = format!("{self}\n    at {self:?}");
        let mut source = self.source();
        while let Some(err) = source {
            let _ = write!(trace, "\n    caused by: {err}");
            source = err.source();
        }
        Some(trace)
    }
}

/// What the error boundary needs to render a failure.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub trace: Option<String>,
    /// Whether the failure chose its own status instead of the 500 default.
    pub explicit_status: bool,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
            trace: err.trace(),
            explicit_status: err.explicit_status().is_some(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(&self);

        // Capture server errors to Sentry
        if report.status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = report.status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = report.status.as_u16(), "Request rejected");
        }

        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Response for a handler that panicked, for `CatchPanicLayer::custom`.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AppError::Panic(detail).into_response()
}
