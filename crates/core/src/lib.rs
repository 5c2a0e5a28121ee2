//! ProShop Core - Shared transport types.
//!
//! This crate provides the types shared by the storefront gateway and anything
//! that talks to it:
//! - `storefront` - HTTP entry point (security, CORS, caching, static delivery)
//! - `integration-tests` - End-to-end checks against a bound server
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! server, no persistence. The route table lives here so that it can be
//! inspected without pulling in the web framework.
//!
//! # Modules
//!
//! - [`types`] - Deployment mode, response envelopes, and the route table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
