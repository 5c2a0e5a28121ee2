//! Handler groups for the resource families under `/api`.
//!
//! Product, user, order and upload handlers are supplied by the caller as
//! plain routers. A group nobody supplied is "detached": every request to
//! it fails with `503 <group> service unavailable`.

use std::collections::HashMap;

use axum::{Router, http::StatusCode, routing::any};
use proshop_core::ResourceGroup;

use crate::error::AppError;
use crate::middleware::not_found;
use crate::state::AppState;

/// Routers for each [`ResourceGroup`], nested under its table prefix.
#[derive(Default)]
pub struct HandlerGroups {
    routers: HashMap<ResourceGroup, Router<AppState>>,
}

impl HandlerGroups {
    /// No group attached; everything under the group prefixes answers 503.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Attach `router` for `group`, replacing any earlier one.
    #[must_use]
    pub fn with(mut self, group: ResourceGroup, router: Router<AppState>) -> Self {
        self.routers.insert(group, router);
        self
    }

    #[must_use]
    pub fn is_attached(&self, group: ResourceGroup) -> bool {
        self.routers.contains_key(&group)
    }

    /// Groups with no router attached.
    pub fn detached_groups(&self) -> impl Iterator<Item = ResourceGroup> + '_ {
        ResourceGroup::ALL
            .into_iter()
            .filter(|group| !self.is_attached(*group))
    }

    /// Take the router for `group`, or a detached one.
    ///
    /// Paths under the group prefix that the router does not know go on to
    /// the application fallback; known paths with an unsupported method are
    /// not found.
    pub fn take(&mut self, group: ResourceGroup) -> Router<AppState> {
        self.routers
            .remove(&group)
            .unwrap_or_else(|| detached(group))
            .method_not_allowed_fallback(not_found)
    }
}

fn detached(group: ResourceGroup) -> Router<AppState> {
    let unavailable = move || async move {
        AppError::handler(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{} service unavailable", group.name()),
        )
    };
    Router::new()
        .route("/", any(unavailable))
        .route("/{*rest}", any(unavailable))
}
