//! Authentication and authorization module

pub mod middleware;

pub use middleware::{auth_middleware, AuthConfig};
pub use ops_types::auth::{ApiKeyAuthenticator, MemoryRateLimiter, NoAuthenticator};
