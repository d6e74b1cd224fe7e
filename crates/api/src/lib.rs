//! Ops API
//!
//! Axum-based API with routes and middleware for the commerce operations
//! service.

pub mod auth;
pub mod handlers;
pub mod logging;
pub mod pagination;
pub mod router;
pub mod security;
pub mod state;

pub use router::create_router;
pub use state::AppState;

#[cfg(feature = "openapi")]
pub mod openapi;
