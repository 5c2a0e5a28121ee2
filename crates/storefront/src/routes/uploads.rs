//! `/uploads` static delivery.

use axum::{
    extract::{Request, State},
    response::Response,
};

use crate::error::Result;
use crate::state::AppState;

/// Stream a file from the uploads root.
///
/// Mounted with `nest_service`, so `request` arrives with the `/uploads`
/// prefix already stripped.
pub async fn serve_upload(State(state): State<AppState>, request: Request) -> Result<Response> {
    state.uploads().serve(request).await
}
