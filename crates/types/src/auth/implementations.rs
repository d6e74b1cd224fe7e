//! Common authentication and rate limiting implementations

use super::errors::*;
use super::traits::*;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// No-op authenticator that allows all requests
#[derive(Debug, Default)]
pub struct NoAuthenticator;

#[async_trait]
impl Authenticator for NoAuthenticator {
	async fn authenticate(&self, _request: &AuthRequest) -> AuthenticationResult {
		debug!("NoAuthenticator: bypassing authentication");
		AuthenticationResult::Bypassed
	}

	async fn authorize(&self, _context: &AuthContext, _permission: &Permission) -> bool {
		true
	}

	fn get_rate_limits(&self, _context: &AuthContext) -> Option<RateLimits> {
		None
	}

	async fn health_check(&self) -> Result<bool, AuthError> {
		Ok(true)
	}

	fn name(&self) -> &str {
		"NoAuthenticator"
	}
}

/// Simple API key authenticator
#[derive(Debug)]
pub struct ApiKeyAuthenticator {
	/// Valid API keys mapped to caller contexts
	api_keys: Arc<DashMap<String, AuthContext>>,
}

impl ApiKeyAuthenticator {
	pub fn new() -> Self {
		Self {
			api_keys: Arc::new(DashMap::new()),
		}
	}

	/// Add an API key with associated context
	pub fn add_key(&self, api_key: String, context: AuthContext) {
		self.api_keys.insert(api_key, context);
	}

	/// Remove an API key
	pub fn remove_key(&self, api_key: &str) -> Option<AuthContext> {
		self.api_keys.remove(api_key).map(|(_, context)| context)
	}

	/// Create with a default admin key
	pub fn with_admin_key(admin_key: String) -> Self {
		let auth = Self::new();
		let admin_context = AuthContext::new("admin".to_string())
			.with_role("admin".to_string())
			.with_permission(Permission::Admin)
			.with_permission(Permission::ReadOrders)
			.with_permission(Permission::SubmitCheckout)
			.with_permission(Permission::ManageShipping)
			.with_permission(Permission::RunOps)
			.with_permission(Permission::HealthCheck);

		auth.add_key(admin_key, admin_context);
		auth
	}
}

impl Default for ApiKeyAuthenticator {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
	async fn authenticate(&self, request: &AuthRequest) -> AuthenticationResult {
		if let Some(api_key) = request.get_api_key() {
			if let Some(context) = self.api_keys.get(api_key) {
				if context.is_expired() {
					warn!("API key for user {} has expired", context.user_id);
					return AuthenticationResult::Unauthorized("API key expired".to_string());
				}
				debug!("API key authenticated for user {}", context.user_id);
				return AuthenticationResult::Authorized(context.clone());
			}
		}

		AuthenticationResult::Unauthorized("Invalid or missing API key".to_string())
	}

	async fn authorize(&self, context: &AuthContext, permission: &Permission) -> bool {
		if context.has_role("admin") || context.has_permission(&Permission::Admin) {
			return true;
		}
		context.has_permission(permission)
	}

	fn get_rate_limits(&self, context: &AuthContext) -> Option<RateLimits> {
		context.rate_limits.clone()
	}

	async fn health_check(&self) -> Result<bool, AuthError> {
		Ok(true)
	}

	fn name(&self) -> &str {
		"ApiKeyAuthenticator"
	}
}

/// In-memory fixed-window rate limiter
#[derive(Debug)]
pub struct MemoryRateLimiter {
	/// Request counters by key
	counters: Arc<DashMap<String, RequestCounter>>,
}

#[derive(Debug, Clone)]
struct RequestCounter {
	count: u32,
	window_start: chrono::DateTime<Utc>,
	window_duration: u64,
}

impl MemoryRateLimiter {
	pub fn new() -> Self {
		Self {
			counters: Arc::new(DashMap::new()),
		}
	}

	/// Clean up expired windows (called opportunistically)
	pub fn cleanup_expired(&self) {
		let now = Utc::now();
		let mut to_remove = Vec::new();

		for entry in self.counters.iter() {
			let counter = entry.value();
			let window_end =
				counter.window_start + Duration::seconds(counter.window_duration as i64);
			if now > window_end {
				to_remove.push(entry.key().clone());
			}
		}

		for key in to_remove {
			self.counters.remove(&key);
		}
	}
}

impl Default for MemoryRateLimiter {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
	async fn check_rate_limit(
		&self,
		key: &str,
		limits: &RateLimits,
	) -> RateLimitResult<RateLimitCheck> {
		let now = Utc::now();
		let window_duration = 60; // 1 minute window

		// Clean up expired entries periodically
		if rand::random::<f64>() < 0.01 {
			self.cleanup_expired();
		}

		let mut entry = self
			.counters
			.entry(key.to_string())
			.or_insert_with(|| RequestCounter {
				count: 0,
				window_start: now,
				window_duration,
			});

		let counter = entry.value_mut();

		let window_end = counter.window_start + Duration::seconds(window_duration as i64);
		if now > window_end {
			counter.count = 0;
			counter.window_start = now;
		}

		let allowed = counter.count < limits.requests_per_minute;
		let remaining = limits.requests_per_minute.saturating_sub(counter.count);
		let reset_at = counter.window_start + Duration::seconds(window_duration as i64);

		Ok(RateLimitCheck {
			allowed,
			remaining,
			reset_at,
			limit: limits.requests_per_minute,
		})
	}

	async fn record_request(&self, key: &str) -> Result<(), RateLimitError> {
		let now = Utc::now();
		let window_duration = 60;

		let mut entry = self
			.counters
			.entry(key.to_string())
			.or_insert_with(|| RequestCounter {
				count: 0,
				window_start: now,
				window_duration,
			});

		let counter = entry.value_mut();

		let window_end = counter.window_start + Duration::seconds(window_duration as i64);
		if now > window_end {
			counter.count = 1;
			counter.window_start = now;
		} else {
			counter.count += 1;
		}

		Ok(())
	}

	async fn reset_limit(&self, key: &str) -> Result<(), RateLimitError> {
		self.counters.remove(key);
		Ok(())
	}

	async fn health_check(&self) -> Result<bool, RateLimitError> {
		Ok(true)
	}

	fn name(&self) -> &str {
		"MemoryRateLimiter"
	}
}
