//! Vendor gateway traits
//!
//! Each vendor surface this service composes against gets one object-safe
//! trait. Handlers and services hold `Arc<dyn ...>` so tests can swap in
//! mocks without touching the wire.

use async_trait::async_trait;
use std::fmt::Debug;

use super::errors::GatewayResult;
use super::models::{
	CreateIntentParams, OutboundEmail, PaymentIntent, RateParams, RateQuote, Refund, ShippingLabel,
	TrackingStatus,
};

/// Payment vendor operations (intent lifecycle + refunds)
#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
	/// Create a payment intent for the given amount
	async fn create_intent(&self, params: &CreateIntentParams) -> GatewayResult<PaymentIntent>;

	/// Fetch the current state of an intent
	async fn get_intent(&self, intent_id: &str) -> GatewayResult<PaymentIntent>;

	/// Refund a captured charge, fully when `amount` is None
	async fn refund(&self, charge_id: &str, amount: Option<i64>) -> GatewayResult<Refund>;

	/// Vendor reachability check
	async fn health_check(&self) -> GatewayResult<bool>;

	/// Human-readable vendor name
	fn name(&self) -> &str;
}

/// Shipping vendor operations (rates, labels, tracking)
#[async_trait]
pub trait ShippingGateway: Send + Sync + Debug {
	/// Fetch carrier rates for a parcel
	async fn fetch_rates(&self, params: &RateParams) -> GatewayResult<Vec<RateQuote>>;

	/// Purchase a label for a previously quoted rate
	async fn purchase_label(
		&self,
		carrier_id: &str,
		service_code: &str,
		params: &RateParams,
	) -> GatewayResult<ShippingLabel>;

	/// Current tracking state for a shipment
	async fn track(&self, carrier_id: &str, tracking_number: &str)
		-> GatewayResult<TrackingStatus>;

	/// Vendor reachability check
	async fn health_check(&self) -> GatewayResult<bool>;

	fn name(&self) -> &str;
}

/// Transactional email vendor
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
	/// Send one email; returns the vendor message id
	async fn send(&self, email: &OutboundEmail) -> GatewayResult<String>;

	/// Vendor reachability check
	async fn health_check(&self) -> GatewayResult<bool>;

	fn name(&self) -> &str;
}
