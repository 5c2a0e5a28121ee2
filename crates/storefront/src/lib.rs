//! ProShop storefront gateway library.
//!
//! This crate provides the HTTP entry pipeline as a library, allowing it to
//! be tested and embedded with real handler groups.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod body;
pub mod config;
pub mod error;
pub mod fallback;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod static_files;

pub use config::StorefrontConfig;
pub use routes::{HandlerGroups, app};
pub use state::AppState;
