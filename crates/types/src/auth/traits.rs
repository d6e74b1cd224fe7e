//! Core authentication and authorization traits

use super::errors::{AuthError, RateLimitError, RateLimitResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authentication result with caller context
#[derive(Debug, Clone)]
pub enum AuthenticationResult {
	/// Authentication successful with caller context
	Authorized(AuthContext),
	/// Authentication failed
	Unauthorized(String),
	/// Authentication bypassed (public endpoints, signed webhooks)
	Bypassed,
}

/// Authenticated caller context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
	/// Unique caller identifier
	pub user_id: String,
	/// Caller roles
	pub roles: Vec<String>,
	/// Specific permissions
	pub permissions: Vec<Permission>,
	/// Rate limiting configuration for this caller
	pub rate_limits: Option<RateLimits>,
	/// Additional metadata
	pub metadata: HashMap<String, String>,
	pub created_at: DateTime<Utc>,
	/// When this context expires (for tokens)
	pub expires_at: Option<DateTime<Utc>>,
}

/// Authorization permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Permission {
	/// Read orders and shipments
	ReadOrders,
	/// Run checkout
	SubmitCheckout,
	/// Fetch rates and purchase labels
	ManageShipping,
	/// Trigger drain flushes and backfills
	RunOps,
	/// Admin operations
	Admin,
	/// Health check access
	HealthCheck,
	/// Custom permission
	Custom(String),
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimits {
	pub requests_per_minute: u32,
	pub burst_size: u32,
}

/// Authentication request context
#[derive(Debug, Clone)]
pub struct AuthRequest {
	/// HTTP headers
	pub headers: HashMap<String, String>,
	/// Request path
	pub path: String,
	/// HTTP method
	pub method: String,
	/// Client IP address
	pub client_ip: Option<String>,
}

impl AuthRequest {
	/// Pull the API key out of the conventional headers
	pub fn get_api_key(&self) -> Option<&str> {
		if let Some(key) = self.headers.get("x-api-key") {
			return Some(key.as_str());
		}
		self.headers
			.get("authorization")
			.and_then(|v| v.strip_prefix("Bearer "))
	}
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitCheck {
	pub allowed: bool,
	/// Remaining requests in current window
	pub remaining: u32,
	/// When the rate limit resets
	pub reset_at: DateTime<Utc>,
	/// Total limit for the window
	pub limit: u32,
}

/// Core authentication trait for custom auth implementations
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
	/// Authenticate a request and return caller context
	async fn authenticate(&self, request: &AuthRequest) -> AuthenticationResult;

	/// Check if caller has permission for a specific action
	async fn authorize(&self, context: &AuthContext, permission: &Permission) -> bool;

	/// Get rate limits for the authenticated caller
	fn get_rate_limits(&self, context: &AuthContext) -> Option<RateLimits>;

	/// Health check for the auth backend
	async fn health_check(&self) -> Result<bool, AuthError>;

	/// Human-readable name for this authenticator
	fn name(&self) -> &str;
}

/// Rate limiting trait for custom rate limiter implementations
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
	/// Check if a request is within rate limits
	async fn check_rate_limit(
		&self,
		key: &str,
		limits: &RateLimits,
	) -> RateLimitResult<RateLimitCheck>;

	/// Record a request for rate limiting
	async fn record_request(&self, key: &str) -> Result<(), RateLimitError>;

	/// Reset rate limit for a key (admin operation)
	async fn reset_limit(&self, key: &str) -> Result<(), RateLimitError>;

	/// Health check for the rate limiter
	async fn health_check(&self) -> Result<bool, RateLimitError>;

	fn name(&self) -> &str;
}

impl AuthContext {
	pub fn new(user_id: String) -> Self {
		Self {
			user_id,
			roles: Vec::new(),
			permissions: Vec::new(),
			rate_limits: None,
			metadata: HashMap::new(),
			created_at: Utc::now(),
			expires_at: None,
		}
	}

	pub fn is_expired(&self) -> bool {
		match self.expires_at {
			Some(expires_at) => Utc::now() > expires_at,
			None => false,
		}
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|r| r == role)
	}

	pub fn has_permission(&self, permission: &Permission) -> bool {
		self.permissions.contains(permission)
	}

	pub fn with_role(mut self, role: String) -> Self {
		self.roles.push(role);
		self
	}

	pub fn with_permission(mut self, permission: Permission) -> Self {
		self.permissions.push(permission);
		self
	}

	pub fn with_rate_limits(mut self, rate_limits: RateLimits) -> Self {
		self.rate_limits = Some(rate_limits);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn test_context_expiry() {
		let mut context = AuthContext::new("ops".to_string());
		assert!(!context.is_expired());

		context.expires_at = Some(Utc::now() - Duration::minutes(1));
		assert!(context.is_expired());
	}

	#[test]
	fn test_api_key_extraction() {
		let mut headers = HashMap::new();
		headers.insert("authorization".to_string(), "Bearer key-123".to_string());
		let request = AuthRequest {
			headers,
			path: "/api/v1/orders".to_string(),
			method: "GET".to_string(),
			client_ip: None,
		};
		assert_eq!(request.get_api_key(), Some("key-123"));
	}
}
