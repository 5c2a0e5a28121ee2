//! Process-wide route table.
//!
//! The table is fixed at compile time and only ever read. Matching is by
//! path prefix on segment boundaries, so `/api/upload` matches
//! `/api/upload/123` but never `/api/uploads`.

use serde::{Deserialize, Serialize};

/// Resource families whose handlers live outside the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGroup {
    Products,
    Users,
    Orders,
    Upload,
}

impl ResourceGroup {
    pub const ALL: [Self; 4] = [Self::Products, Self::Users, Self::Orders, Self::Upload];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Users => "users",
            Self::Orders => "orders",
            Self::Upload => "upload",
        }
    }
}

/// Where a matched prefix sends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// An external handler group.
    Group(ResourceGroup),
    /// Inline handler disclosing the PayPal client ID.
    PaypalConfig,
    /// Static delivery from the uploads root.
    Uploads,
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub prefix: &'static str,
    pub destination: Destination,
    /// Only the prefix itself matches, never paths below it.
    pub exact: bool,
}

impl Route {
    const fn nested(prefix: &'static str, destination: Destination) -> Self {
        Self {
            prefix,
            destination,
            exact: false,
        }
    }

    /// Whether `path` falls under this route.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if path == self.prefix {
            return true;
        }
        if self.exact {
            return false;
        }
        path.strip_prefix(self.prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// The gateway's dispatch table. Anything not listed here goes to the
/// fallback handler.
pub const ROUTE_TABLE: &[Route] = &[
    Route::nested("/api/products", Destination::Group(ResourceGroup::Products)),
    Route::nested("/api/users", Destination::Group(ResourceGroup::Users)),
    Route::nested("/api/orders", Destination::Group(ResourceGroup::Orders)),
    Route::nested("/api/upload", Destination::Group(ResourceGroup::Upload)),
    Route {
        prefix: "/api/config/paypal",
        destination: Destination::PaypalConfig,
        exact: true,
    },
    Route::nested("/uploads", Destination::Uploads),
];

/// Prefix reserved for JSON endpoints.
pub const API_PREFIX: &str = "/api";

/// Whether `path` is under [`API_PREFIX`], whether or not a row claims it.
///
/// Such paths never receive the client application's entry document.
#[must_use]
pub fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Resolve a request path to its route using longest-prefix matching.
///
/// Returns `None` when the path belongs to the fallback handler.
#[must_use]
pub fn resolve(path: &str) -> Option<&'static Route> {
    ROUTE_TABLE
        .iter()
        .filter(|route| route.matches(path))
        .max_by_key(|route| route.prefix.len())
}
