//! Mock vendor gateways for examples and testing
//!
//! Working stand-ins for the payment, shipping, and mail vendors with call
//! tracking, configurable failure, and configurable delay. The builder falls
//! back to these when a vendor is disabled in settings, so a development
//! instance runs end-to-end with no credentials at all.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ops_types::{
	CreateIntentParams, GatewayError, GatewayResult, Mailer, OutboundEmail, PaymentGateway,
	PaymentIntent, PaymentIntentStatus, RateParams, RateQuote, Refund, ShippingGateway,
	ShippingLabel, TrackingStatus,
};

/// Shared knobs for every mock gateway
#[derive(Debug, Clone)]
pub struct MockBehavior {
	pub should_fail: bool,
	pub response_delay_ms: u64,
}

impl Default for MockBehavior {
	fn default() -> Self {
		Self {
			should_fail: false,
			response_delay_ms: 0,
		}
	}
}

impl MockBehavior {
	async fn apply(&self, vendor: &str) -> GatewayResult<()> {
		if self.response_delay_ms > 0 {
			tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
		}
		if self.should_fail {
			return Err(GatewayError::api_failure(vendor, 500, "mock failure"));
		}
		Ok(())
	}
}

/// Mock payment gateway issuing deterministic intents
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
	behavior: MockBehavior,
	calls: Arc<AtomicUsize>,
}

impl MockPaymentGateway {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self {
			behavior: MockBehavior {
				should_fail: true,
				..MockBehavior::default()
			},
			..Self::default()
		}
	}

	pub fn with_delay(delay_ms: u64) -> Self {
		Self {
			behavior: MockBehavior {
				response_delay_ms: delay_ms,
				..MockBehavior::default()
			},
			..Self::default()
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
	async fn create_intent(&self, params: &CreateIntentParams) -> GatewayResult<PaymentIntent> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.behavior.apply("mock-payments").await?;
		// Deterministic id derived from the idempotency key so retries
		// observably reuse the intent
		Ok(PaymentIntent {
			intent_id: format!("pi_mock_{}", params.idempotency_key),
			client_secret: Some(format!("pi_mock_{}_secret", params.idempotency_key)),
			amount: params.amount,
			currency: params.currency.clone(),
			status: PaymentIntentStatus::RequiresPaymentMethod,
			latest_charge_id: None,
		})
	}

	async fn get_intent(&self, intent_id: &str) -> GatewayResult<PaymentIntent> {
		self.behavior.apply("mock-payments").await?;
		Ok(PaymentIntent {
			intent_id: intent_id.to_string(),
			client_secret: None,
			amount: 0,
			currency: "usd".to_string(),
			status: PaymentIntentStatus::Succeeded,
			latest_charge_id: Some(format!("ch_mock_{}", intent_id)),
		})
	}

	async fn refund(&self, charge_id: &str, amount: Option<i64>) -> GatewayResult<Refund> {
		self.behavior.apply("mock-payments").await?;
		Ok(Refund {
			refund_id: format!("re_mock_{}", charge_id),
			amount: amount.unwrap_or(0),
			status: "succeeded".to_string(),
		})
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		Ok(!self.behavior.should_fail)
	}

	fn name(&self) -> &str {
		"mock-payments"
	}
}

/// Mock shipping gateway quoting two fixed services
#[derive(Debug, Default)]
pub struct MockShippingGateway {
	behavior: MockBehavior,
	calls: Arc<AtomicUsize>,
}

impl MockShippingGateway {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self {
			behavior: MockBehavior {
				should_fail: true,
				..MockBehavior::default()
			},
			..Self::default()
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ShippingGateway for MockShippingGateway {
	async fn fetch_rates(&self, _params: &RateParams) -> GatewayResult<Vec<RateQuote>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.behavior.apply("mock-shipping").await?;
		Ok(vec![
			RateQuote {
				carrier_id: "mock-usps".to_string(),
				service_code: "usps_priority".to_string(),
				amount: 895,
				currency: "usd".to_string(),
				delivery_days: Some(3),
			},
			RateQuote {
				carrier_id: "mock-ups".to_string(),
				service_code: "ups_ground".to_string(),
				amount: 1125,
				currency: "usd".to_string(),
				delivery_days: Some(5),
			},
		])
	}

	async fn purchase_label(
		&self,
		carrier_id: &str,
		service_code: &str,
		_params: &RateParams,
	) -> GatewayResult<ShippingLabel> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.behavior.apply("mock-shipping").await?;
		Ok(ShippingLabel {
			label_id: format!("label_mock_{}", self.calls.load(Ordering::SeqCst)),
			tracking_number: format!("TRK{}", 9400_0000_0000u64 + self.call_count() as u64),
			label_url: Some("https://labels.example.com/mock.pdf".to_string()),
			carrier_id: carrier_id.to_string(),
			service_code: service_code.to_string(),
			amount: 895,
			currency: "usd".to_string(),
		})
	}

	async fn track(
		&self,
		_carrier_id: &str,
		tracking_number: &str,
	) -> GatewayResult<TrackingStatus> {
		self.behavior.apply("mock-shipping").await?;
		Ok(TrackingStatus {
			tracking_number: tracking_number.to_string(),
			status_code: "IT".to_string(),
			description: "In transit".to_string(),
			estimated_delivery: None,
		})
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		Ok(!self.behavior.should_fail)
	}

	fn name(&self) -> &str {
		"mock-shipping"
	}
}

/// Mock mailer that records every send
#[derive(Debug, Default)]
pub struct MockMailer {
	behavior: MockBehavior,
	sent: Arc<AtomicUsize>,
}

impl MockMailer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self {
			behavior: MockBehavior {
				should_fail: true,
				..MockBehavior::default()
			},
			..Self::default()
		}
	}

	pub fn sent_count(&self) -> usize {
		self.sent.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Mailer for MockMailer {
	async fn send(&self, _email: &OutboundEmail) -> GatewayResult<String> {
		self.behavior.apply("mock-mail").await?;
		let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(format!("msg_mock_{}", n))
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		Ok(!self.behavior.should_fail)
	}

	fn name(&self) -> &str {
		"mock-mail"
	}
}
