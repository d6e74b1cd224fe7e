//! Shipping documents: rate quotes and shipments

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::models::DocId;

pub mod errors;

pub use errors::ShippingError;

/// Default validity window for a stored rate quote
pub const DEFAULT_QUOTE_TTL_MINUTES: i64 = 30;

/// A carrier rate quote persisted against an order
///
/// Quotes expire; purchasing a label requires an unexpired quote so the price
/// shown at checkout is the price paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ShippingQuote {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	pub order: DocId,
	pub carrier_id: String,
	pub service_code: String,
	/// Amount in minor currency units
	pub amount: i64,
	pub currency: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_days: Option<u32>,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl ShippingQuote {
	pub fn new(
		order: DocId,
		carrier_id: String,
		service_code: String,
		amount: i64,
		currency: String,
	) -> Self {
		let now = Utc::now();
		Self {
			id: DocId::random_with_prefix("quote"),
			rev: None,
			order,
			carrier_id,
			service_code,
			amount,
			currency,
			delivery_days: None,
			created_at: now,
			expires_at: now + Duration::minutes(DEFAULT_QUOTE_TTL_MINUTES),
		}
	}

	pub fn is_expired(&self) -> bool {
		Utc::now() > self.expires_at
	}

	pub fn with_delivery_days(mut self, days: u32) -> Self {
		self.delivery_days = Some(days);
		self
	}

	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.expires_at = self.created_at + ttl;
		self
	}
}

/// Shipment lifecycle status, as reported by the carrier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum ShipmentStatus {
	LabelCreated,
	InTransit,
	Delivered,
	Exception,
}

/// Shipment document, created when a label is purchased
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Shipment {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	pub order: DocId,
	pub carrier_id: String,
	pub service_code: String,
	/// Vendor label id
	pub label_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label_url: Option<String>,
	pub tracking_number: String,
	pub status: ShipmentStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Shipment {
	pub fn new(
		order: DocId,
		carrier_id: String,
		service_code: String,
		label_id: String,
		tracking_number: String,
	) -> Self {
		let now = Utc::now();
		Self {
			id: DocId::random_with_prefix("shipment"),
			rev: None,
			order,
			carrier_id,
			service_code,
			label_id,
			label_url: None,
			tracking_number,
			status: ShipmentStatus::LabelCreated,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn with_label_url(mut self, url: String) -> Self {
		self.label_url = Some(url);
		self
	}
}

/// Destination address for rate requests and labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub name: String,
	pub line1: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line2: Option<String>,
	pub city: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	pub postal_code: String,
	/// ISO 3166-1 alpha-2
	pub country: String,
}

/// Parcel dimensions and weight for a rate request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
	pub weight_grams: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub length_cm: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width_cm: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub height_cm: Option<u32>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quote_expiry() {
		let quote = ShippingQuote::new(
			DocId::new("order.1"),
			"usps".to_string(),
			"usps_priority".to_string(),
			895,
			"usd".to_string(),
		);
		assert!(!quote.is_expired());

		let expired = quote.with_ttl(Duration::minutes(-1));
		assert!(expired.is_expired());
	}
}
