//! Payment gateway over the Stripe REST API
//!
//! Form-encoded requests against `/v1/payment_intents` and `/v1/refunds`,
//! bearer-authenticated with the account secret key. Creates carry an
//! `Idempotency-Key` header so checkout retries reuse the same intent.

use async_trait::async_trait;
use ops_types::{
	CreateIntentParams, GatewayError, GatewayResult, PaymentGateway, PaymentIntent,
	PaymentIntentStatus, Refund, SecretString,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client_cache::{ClientCache, ClientConfig};

const VENDOR: &str = "stripe";

/// Configuration for the Stripe gateway
#[derive(Debug, Clone)]
pub struct StripeGatewayConfig {
	pub endpoint: String,
	pub secret_key: SecretString,
	pub timeout_ms: u64,
}

/// Stripe-backed implementation of [`PaymentGateway`]
#[derive(Debug)]
pub struct StripeGateway {
	config: StripeGatewayConfig,
	cache: ClientCache,
}

/// Wire shape of a payment intent
#[derive(Debug, Deserialize)]
struct IntentObject {
	id: String,
	#[serde(default)]
	client_secret: Option<String>,
	amount: i64,
	currency: String,
	status: String,
	#[serde(default)]
	latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundObject {
	id: String,
	amount: i64,
	status: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
	#[serde(default)]
	message: String,
}

impl StripeGateway {
	pub fn new(config: StripeGatewayConfig) -> Self {
		Self {
			config,
			cache: ClientCache::for_gateway(),
		}
	}

	pub fn with_cache(config: StripeGatewayConfig, cache: ClientCache) -> Self {
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

	async fn read_error(response: reqwest::Response) -> GatewayError {
		let status = response.status().as_u16();
		let message = match response.json::<ApiErrorBody>().await {
			Ok(body) => body.error.message,
			Err(_) => String::from("unreadable error body"),
		};
		GatewayError::api_failure(VENDOR, status, message)
	}

	fn into_intent(raw: IntentObject) -> GatewayResult<PaymentIntent> {
		let status = match raw.status.as_str() {
			"requires_payment_method" => PaymentIntentStatus::RequiresPaymentMethod,
			"requires_confirmation" | "requires_action" => {
				PaymentIntentStatus::RequiresConfirmation
			},
			"processing" => PaymentIntentStatus::Processing,
			"succeeded" => PaymentIntentStatus::Succeeded,
			"canceled" => PaymentIntentStatus::Canceled,
			other => {
				return Err(GatewayError::InvalidResponse {
					reason: format!("unknown intent status '{}'", other),
				})
			},
		};
		Ok(PaymentIntent {
			intent_id: raw.id,
			client_secret: raw.client_secret,
			amount: raw.amount,
			currency: raw.currency,
			status,
			latest_charge_id: raw.latest_charge,
		})
	}
}

#[async_trait]
impl PaymentGateway for StripeGateway {
	async fn create_intent(&self, params: &CreateIntentParams) -> GatewayResult<PaymentIntent> {
		debug!(
			"Creating payment intent for {} {} (idempotency key {})",
			params.amount, params.currency, params.idempotency_key
		);

		let mut form: Vec<(String, String)> = vec![
			("amount".to_string(), params.amount.to_string()),
			("currency".to_string(), params.currency.clone()),
			(
				"automatic_payment_methods[enabled]".to_string(),
				"true".to_string(),
			),
		];
		if let Some(email) = &params.receipt_email {
			form.push(("receipt_email".to_string(), email.clone()));
		}
		for (key, value) in &params.metadata {
			form.push((format!("metadata[{}]", key), value.clone()));
		}

		let response = self
			.client()?
			.post(self.url("/v1/payment_intents"))
			.bearer_auth(self.config.secret_key.expose_secret())
			.header("Idempotency-Key", &params.idempotency_key)
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.form(&form)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let raw: IntentObject = response.json().await.map_err(GatewayError::Http)?;
		Self::into_intent(raw)
	}

	async fn get_intent(&self, intent_id: &str) -> GatewayResult<PaymentIntent> {
		let response = self
			.client()?
			.get(self.url(&format!("/v1/payment_intents/{}", intent_id)))
			.bearer_auth(self.config.secret_key.expose_secret())
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let raw: IntentObject = response.json().await.map_err(GatewayError::Http)?;
		Self::into_intent(raw)
	}

	async fn refund(&self, charge_id: &str, amount: Option<i64>) -> GatewayResult<Refund> {
		let mut form: Vec<(String, String)> = vec![("charge".to_string(), charge_id.to_string())];
		if let Some(amount) = amount {
			form.push(("amount".to_string(), amount.to_string()));
		}

		let response = self
			.client()?
			.post(self.url("/v1/refunds"))
			.bearer_auth(self.config.secret_key.expose_secret())
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.form(&form)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let raw: RefundObject = response.json().await.map_err(GatewayError::Http)?;
		Ok(Refund {
			refund_id: raw.id,
			amount: raw.amount,
			status: raw.status,
		})
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		// Balance read is the cheapest authenticated call
		let response = self
			.client()?
			.get(self.url("/v1/balance"))
			.bearer_auth(self.config.secret_key.expose_secret())
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

	fn test_gateway() -> StripeGateway {
		StripeGateway::new(StripeGatewayConfig {
			endpoint: "https://api.stripe.com/".to_string(),
			secret_key: SecretString::from_str("sk_test_123"),
			timeout_ms: 5000,
		})
	}

	#[test]
	fn test_url_building() {
		let gateway = test_gateway();
		assert_eq!(
			gateway.url("/v1/payment_intents"),
			"https://api.stripe.com/v1/payment_intents"
		);
	}

	#[test]
	fn test_intent_status_mapping() {
		let raw = IntentObject {
			id: "pi_1".to_string(),
			client_secret: Some("pi_1_secret".to_string()),
			amount: 4500,
			currency: "usd".to_string(),
			status: "succeeded".to_string(),
			latest_charge: Some("ch_1".to_string()),
		};
		let intent = StripeGateway::into_intent(raw).unwrap();
		assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
		assert_eq!(intent.latest_charge_id.as_deref(), Some("ch_1"));
	}

	#[test]
	fn test_unknown_status_is_rejected() {
		let raw = IntentObject {
			id: "pi_1".to_string(),
			client_secret: None,
			amount: 100,
			currency: "usd".to_string(),
			status: "definitely_new_status".to_string(),
			latest_charge: None,
		};
		assert!(matches!(
			StripeGateway::into_intent(raw),
			Err(GatewayError::InvalidResponse { .. })
		));
	}
}
