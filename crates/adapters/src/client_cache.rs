//! HTTP client cache for optimized connection management
//!
//! Provides per-vendor client instances with connection pooling and
//! keep-alive optimization. Clients are cached by configuration and expire
//! on a TTL so header or credential rotations eventually take effect.

use dashmap::DashMap;
use ops_types::{GatewayError, GatewayResult};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for creating an optimized HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	/// Vendor base endpoint
	pub base_url: String,
	/// Vendor identifier for cache differentiation
	pub vendor: String,
	/// Maximum number of idle connections per host
	pub max_idle_per_host: usize,
	/// Connection keep-alive timeout
	pub keep_alive_timeout_ms: u64,
	/// Default headers (auth included)
	pub headers: Vec<(String, String)>,
}

impl ClientConfig {
	pub fn for_vendor(vendor: &str, base_url: &str) -> Self {
		Self {
			base_url: base_url.to_string(),
			vendor: vendor.to_string(),
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			headers: vec![(
				"User-Agent".to_string(),
				"commerce-ops/1.0".to_string(),
			)],
		}
	}

	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		self.headers.push((name.to_string(), value.to_string()));
		self
	}
}

/// Cached client with creation timestamp for TTL management
#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn new(client: Client) -> Self {
		Self {
			client: Arc::new(client),
			created_at: Instant::now(),
		}
	}

	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

/// Thread-safe cache of HTTP clients keyed by configuration, with TTL
#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Create a new client cache with the default 30-minute TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Get or create an optimized client for the given configuration
	pub fn get_client(&self, config: &ClientConfig) -> GatewayResult<Arc<Client>> {
		// Atomic check and removal of an expired entry
		self.clients
			.remove_if(config, |_, cached| cached.is_expired(self.ttl));

		if let Some(cached) = self.clients.get(config) {
			debug!(
				"Reusing cached client for {} (age: {:?})",
				config.base_url,
				cached.created_at.elapsed()
			);
			return Ok(cached.client.clone());
		}

		debug!("Creating new client for {}", config.base_url);
		let client = Self::build_client(config)?;
		let cached = CachedClient::new(client);
		let client_arc = cached.client.clone();

		// Entry API handles the create race: first writer wins
		use dashmap::mapref::entry::Entry;
		match self.clients.entry(config.clone()) {
			Entry::Occupied(entry) => Ok(entry.get().client.clone()),
			Entry::Vacant(entry) => {
				entry.insert(cached);
				Ok(client_arc)
			},
		}
	}

	fn build_client(config: &ClientConfig) -> GatewayResult<Client> {
		let mut header_map = reqwest::header::HeaderMap::new();
		for (key, value) in &config.headers {
			if let (Ok(name), Ok(value)) = (
				reqwest::header::HeaderName::from_bytes(key.as_bytes()),
				reqwest::header::HeaderValue::from_str(value),
			) {
				header_map.insert(name, value);
			}
		}

		ClientBuilder::new()
			.pool_max_idle_per_host(config.max_idle_per_host)
			.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
			.tcp_keepalive(Duration::from_secs(60))
			.default_headers(header_map)
			.build()
			.map_err(GatewayError::Http)
	}

	/// Remove all expired clients from the cache
	pub fn cleanup_expired(&self) -> usize {
		let mut removed_count = 0;
		self.clients.retain(|_, cached| {
			let expired = cached.is_expired(self.ttl);
			if expired {
				removed_count += 1;
			}
			!expired
		});
		removed_count
	}

	pub fn clear(&self) {
		self.clients.clear();
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Shared process-wide cache for gateway implementations
	pub fn for_gateway() -> Self {
		global_client_cache().clone()
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}

lazy_static::lazy_static! {
	static ref GLOBAL_CLIENT_CACHE: ClientCache = ClientCache::new();
}

/// Get the global client cache instance
pub fn global_client_cache() -> &'static ClientCache {
	&GLOBAL_CLIENT_CACHE
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_client_cache_reuse() {
		let cache = ClientCache::new();
		let config = ClientConfig::for_vendor("stripe", "https://api.stripe.com");

		let client1 = cache.get_client(&config).unwrap();
		let client2 = cache.get_client(&config).unwrap();
		assert!(Arc::ptr_eq(&client1, &client2));
	}

	#[tokio::test]
	async fn test_client_cache_ttl_expiration() {
		let cache = ClientCache::with_ttl(Duration::from_millis(50));
		let config = ClientConfig::for_vendor("resend", "https://api.resend.com");

		let client1 = cache.get_client(&config).unwrap();
		tokio::time::sleep(Duration::from_millis(100)).await;
		let client2 = cache.get_client(&config).unwrap();
		assert!(!Arc::ptr_eq(&client1, &client2));
	}

	#[test]
	fn test_distinct_headers_distinct_clients() {
		let cache = ClientCache::new();
		let base = ClientConfig::for_vendor("shipengine", "https://api.shipengine.com");
		let with_key = base.clone().with_header("API-Key", "key-1");

		let client1 = cache.get_client(&base).unwrap();
		let client2 = cache.get_client(&with_key).unwrap();
		assert!(!Arc::ptr_eq(&client1, &client2));
	}
}
