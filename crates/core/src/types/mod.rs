//! Core types for the ProShop gateway.

pub mod envelope;
pub mod mode;
pub mod route;

pub use envelope::{ErrorEnvelope, PaypalConfigResponse};
pub use mode::DeploymentMode;
pub use route::{API_PREFIX, Destination, ROUTE_TABLE, ResourceGroup, Route, is_api_path, resolve};
