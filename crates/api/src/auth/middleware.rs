//! Authentication middleware using the auth traits

use axum::{
	extract::Request,
	http::{HeaderMap, StatusCode},
	middleware::Next,
	response::Response,
};
use ops_types::auth::{
	AuthRequest, AuthenticationResult, Authenticator, Permission, RateLimiter, RateLimits,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Auth middleware configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Paths that require authentication
	pub protected_paths: Vec<String>,
	/// Paths that are completely public (no auth check)
	pub public_paths: Vec<String>,
	/// Whether to enable rate limiting
	pub enable_rate_limiting: bool,
	/// Default rate limits for unauthenticated callers
	pub default_rate_limits: Option<RateLimits>,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			protected_paths: vec!["/api/v1/".to_string()],
			// Webhooks authenticate by signature, not API key
			public_paths: vec![
				"/health".to_string(),
				"/ready".to_string(),
				"/webhooks/".to_string(),
			],
			enable_rate_limiting: true,
			default_rate_limits: Some(RateLimits {
				requests_per_minute: 100,
				burst_size: 10,
			}),
		}
	}
}

/// Permission required for a path/method pair
fn required_permission(path: &str, method: &str) -> Permission {
	match (path, method) {
		(p, "POST") if p.starts_with("/api/v1/checkout") => Permission::SubmitCheckout,
		(p, _) if p.starts_with("/api/v1/orders") => Permission::ReadOrders,
		(p, _) if p.starts_with("/api/v1/shipping") || p.starts_with("/api/v1/shipments") => {
			Permission::ManageShipping
		},
		(p, _) if p.starts_with("/api/v1/drains") => Permission::RunOps,
		_ => Permission::ReadOrders,
	}
}

/// Authentication middleware function
pub async fn auth_middleware<A, R>(
	authenticator: Arc<A>,
	rate_limiter: Arc<R>,
	config: AuthConfig,
	request: Request,
	next: Next,
) -> Result<Response, StatusCode>
where
	A: Authenticator + ?Sized,
	R: RateLimiter + ?Sized,
{
	let path = request.uri().path().to_string();
	let method = request.method().to_string();

	// Public paths skip auth entirely
	if config.public_paths.iter().any(|p| path.starts_with(p)) {
		debug!("Public path {}, skipping auth", path);
		return Ok(next.run(request).await);
	}

	let headers = headers_to_map(request.headers());
	let client_ip = headers
		.get("x-forwarded-for")
		.or_else(|| headers.get("x-real-ip"))
		.cloned();

	let auth_request = AuthRequest {
		headers,
		path: path.clone(),
		method: method.clone(),
		client_ip: client_ip.clone(),
	};

	let auth_result = authenticator.authenticate(&auth_request).await;

	let (auth_context, rate_limits) = match auth_result {
		AuthenticationResult::Authorized(context) => {
			debug!("Request authenticated for user: {}", context.user_id);
			let limits = authenticator.get_rate_limits(&context);
			(Some(context), limits)
		},
		AuthenticationResult::Bypassed => {
			debug!("Authentication bypassed for path: {}", path);
			(None, config.default_rate_limits.clone())
		},
		AuthenticationResult::Unauthorized(reason) => {
			warn!("Authentication failed for path {}: {}", path, reason);

			if config.protected_paths.iter().any(|p| path.starts_with(p)) {
				return Err(StatusCode::UNAUTHORIZED);
			}
			(None, config.default_rate_limits.clone())
		},
	};

	// Authorization for protected paths
	if config.protected_paths.iter().any(|p| path.starts_with(p)) {
		if let Some(ref context) = auth_context {
			let permission = required_permission(&path, &method);
			if !authenticator.authorize(context, &permission).await {
				warn!(
					"Authorization failed for user {} on path {}",
					context.user_id, path
				);
				return Err(StatusCode::FORBIDDEN);
			}
		}
		// Bypassed (NoAuthenticator) falls through on purpose
	}

	// Rate limiting
	if config.enable_rate_limiting {
		if let Some(limits) = rate_limits {
			let rate_key = match &auth_context {
				Some(context) => format!("user:{}", context.user_id),
				None => format!("ip:{}", client_ip.unwrap_or_else(|| "unknown".to_string())),
			};

			match rate_limiter.check_rate_limit(&rate_key, &limits).await {
				Ok(check) => {
					if !check.allowed {
						warn!("Rate limit exceeded for key: {}", rate_key);
						return Err(StatusCode::TOO_MANY_REQUESTS);
					}
					if let Err(e) = rate_limiter.record_request(&rate_key).await {
						warn!("Failed to record request for rate limiting: {}", e);
					}
				},
				Err(e) => {
					// Degrade open: a broken limiter should not take the
					// API down with it
					warn!("Rate limiter error: {}", e);
				},
			}
		}
	}

	let mut request = request;
	if let Some(context) = auth_context {
		request.extensions_mut().insert(context);
	}

	Ok(next.run(request).await)
}

/// Helper to convert HeaderMap to HashMap<String, String>
fn headers_to_map(headers: &HeaderMap) -> std::collections::HashMap<String, String> {
	let mut map = std::collections::HashMap::new();
	for (name, value) in headers.iter() {
		if let Ok(value_str) = value.to_str() {
			map.insert(name.as_str().to_lowercase(), value_str.to_string());
		}
	}
	map
}
