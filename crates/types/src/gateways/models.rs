//! Wire models shared by the vendor gateways

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shipping::{Address, Parcel};

/// A payment intent as reported by the payment vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
	pub intent_id: String,
	/// Client secret handed to the storefront to confirm the payment
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<String>,
	pub amount: i64,
	pub currency: String,
	pub status: PaymentIntentStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub latest_charge_id: Option<String>,
}

/// Vendor payment-intent states this service cares about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
	RequiresPaymentMethod,
	RequiresConfirmation,
	Processing,
	Succeeded,
	Canceled,
}

/// Parameters for creating a payment intent
#[derive(Debug, Clone)]
pub struct CreateIntentParams {
	pub amount: i64,
	pub currency: String,
	/// Used as the vendor idempotency key so checkout retries reuse the intent
	pub idempotency_key: String,
	pub receipt_email: Option<String>,
	/// Free-form metadata attached to the vendor object, e.g. the order id
	pub metadata: Vec<(String, String)>,
}

/// A refund issued against a charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
	pub refund_id: String,
	pub amount: i64,
	pub status: String,
}

/// A single carrier rate returned by the shipping vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
	pub carrier_id: String,
	pub service_code: String,
	/// Amount in minor currency units
	pub amount: i64,
	pub currency: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_days: Option<u32>,
}

/// Parameters for fetching rates
#[derive(Debug, Clone)]
pub struct RateParams {
	pub ship_to: Address,
	pub ship_from: Address,
	pub parcel: Parcel,
}

/// A purchased shipping label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLabel {
	pub label_id: String,
	pub tracking_number: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label_url: Option<String>,
	pub carrier_id: String,
	pub service_code: String,
	/// What the vendor actually charged, in minor units
	pub amount: i64,
	pub currency: String,
}

/// Tracking state for a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatus {
	pub tracking_number: String,
	pub status_code: String,
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub estimated_delivery: Option<DateTime<Utc>>,
}

/// An outbound transactional email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
	pub from: String,
	pub to: Vec<String>,
	pub subject: String,
	pub html: String,
}

impl OutboundEmail {
	pub fn new(from: String, to: String, subject: String, html: String) -> Self {
		Self {
			from,
			to: vec![to],
			subject,
			html,
		}
	}
}
