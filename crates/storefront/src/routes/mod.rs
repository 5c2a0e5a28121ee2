//! HTTP routes for the storefront gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Handler groups (see `HandlerGroups`)
//! *    /api/products/*         - Products
//! *    /api/users/*            - Users
//! *    /api/orders/*           - Orders
//! *    /api/upload/*           - Image upload
//!
//! GET  /api/config/paypal      - PayPal client ID
//! GET  /uploads/*              - Uploaded files
//!
//! # Fallback
//! GET  /*                      - Client build, then SPA entry document (production)
//! GET  /                       - Liveness text (development)
//! ```

pub mod config;
pub mod groups;
pub mod health;
pub mod uploads;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{any, get},
};
use proshop_core::{Destination, ROUTE_TABLE};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::{Result, panic_response};
use crate::middleware::{
    body_decoding_middleware, cache_control_middleware, error_boundary_middleware,
    make_request_span, not_found, origin_policy_layer, request_id_middleware,
    security_headers_middleware, timeout_middleware,
};
use crate::state::AppState;

pub use groups::HandlerGroups;

/// Build the routes of the route table, without the pipeline stages.
pub fn routes(state: &AppState, mut groups: HandlerGroups) -> Router<AppState> {
    let mut router = Router::new().route("/health", get(health::health));

    for route in ROUTE_TABLE {
        router = match route.destination {
            Destination::Group(group) => router.nest(route.prefix, groups.take(group)),
            Destination::PaypalConfig => router.route(
                route.prefix,
                get(config::paypal_config).fallback(not_found),
            ),
            Destination::Uploads => router.nest_service(
                route.prefix,
                any(uploads::serve_upload).with_state(state.clone()),
            ),
        };
    }

    router
        .fallback(serve_fallback)
        .method_not_allowed_fallback(not_found)
}

/// Build the full application: routes wrapped in every pipeline stage.
///
/// See [`crate::middleware`] for the stage order.
pub fn app(state: AppState, groups: HandlerGroups) -> Router {
    let cors = origin_policy_layer(state.config().cors_origin.clone());

    routes(&state, groups)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), body_decoding_middleware))
        .layer(from_fn_with_state(state.clone(), timeout_middleware))
        .layer(from_fn_with_state(state.clone(), error_boundary_middleware))
        .layer(from_fn(cache_control_middleware))
        .layer(cors)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

async fn serve_fallback(State(state): State<AppState>, request: Request) -> Result<Response> {
    state.fallback().respond(request).await
}
