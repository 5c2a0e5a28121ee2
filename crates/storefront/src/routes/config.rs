//! Client configuration disclosure.

use axum::{Json, extract::State};
use proshop_core::PaypalConfigResponse;

use crate::state::AppState;

/// `GET /api/config/paypal`
///
/// Returns the configured PayPal client ID so the browser can load the
/// checkout SDK. The key is omitted when no ID is configured.
pub async fn paypal_config(State(state): State<AppState>) -> Json<PaypalConfigResponse> {
    Json(PaypalConfigResponse {
        client_id: state.config().paypal_client_id.clone(),
    })
}
