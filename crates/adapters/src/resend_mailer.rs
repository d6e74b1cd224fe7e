//! Transactional email over the Resend REST API
//!
//! One JSON POST to `/emails`, bearer-authenticated.

use async_trait::async_trait;
use ops_types::{GatewayError, GatewayResult, Mailer, OutboundEmail, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client_cache::{ClientCache, ClientConfig};

const VENDOR: &str = "resend";

/// Configuration for the Resend mailer
#[derive(Debug, Clone)]
pub struct ResendMailerConfig {
	pub endpoint: String,
	pub api_key: SecretString,
	pub timeout_ms: u64,
}

/// Resend-backed implementation of [`Mailer`]
#[derive(Debug)]
pub struct ResendMailer {
	config: ResendMailerConfig,
	cache: ClientCache,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
	id: String,
}

impl ResendMailer {
	pub fn new(config: ResendMailerConfig) -> Self {
		Self {
			config,
			cache: ClientCache::for_gateway(),
		}
	}

	pub fn with_cache(config: ResendMailerConfig, cache: ClientCache) -> Self {
		Self { config, cache }
	}

	fn client(&self) -> GatewayResult<Arc<reqwest::Client>> {
		let client_config = ClientConfig::for_vendor(VENDOR, &self.config.endpoint);
		self.cache.get_client(&client_config)
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
	}

	fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
		if e.is_timeout() {
			GatewayError::Timeout {
				timeout_ms: self.config.timeout_ms,
			}
		} else {
			GatewayError::Http(e)
		}
	}
}

#[async_trait]
impl Mailer for ResendMailer {
	async fn send(&self, email: &OutboundEmail) -> GatewayResult<String> {
		debug!("Sending '{}' to {} recipient(s)", email.subject, email.to.len());

		let response = self
			.client()?
			.post(self.url("/emails"))
			.bearer_auth(self.config.api_key.expose_secret())
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.json(email)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(GatewayError::api_failure(VENDOR, status.as_u16(), message));
		}

		let sent: SendResponse = response.json().await.map_err(GatewayError::Http)?;
		Ok(sent.id)
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		// No dedicated health endpoint; domain listing is the cheapest
		// authenticated read.
		let response = self
			.client()?
			.get(self.url("/domains"))
			.bearer_auth(self.config.api_key.expose_secret())
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;
		Ok(response.status().is_success())
	}

	fn name(&self) -> &str {
		VENDOR
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_outbound_email_wire_shape() {
		let email = OutboundEmail::new(
			"orders@example.com".to_string(),
			"jo@example.com".to_string(),
			"Order SO-1001 confirmed".to_string(),
			"<p>Thanks!</p>".to_string(),
		);
		let wire = serde_json::to_value(&email).unwrap();
		assert_eq!(wire["from"], "orders@example.com");
		assert_eq!(wire["to"][0], "jo@example.com");
		assert_eq!(wire["subject"], "Order SO-1001 confirmed");
	}
}
