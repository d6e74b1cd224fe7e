//! Ops Storage
//!
//! Document-store backends for the commerce operations service.
//! Supports an in-memory store and the content store's HTTP data API.

pub mod memory_store;
pub mod traits;

#[cfg(feature = "content-api")]
pub mod content_api_store;

pub use memory_store::MemoryStore;
pub use traits::DocumentStore;

#[cfg(feature = "content-api")]
pub use content_api_store::{ContentApiConfig, ContentApiStore};
