//! Inbound webhook payload models
//!
//! Wire shapes are vendor-defined; these structs cover only the fields this
//! service reads. Unknown fields are ignored on purpose so vendor additions
//! do not break parsing.

use serde::{Deserialize, Serialize};

/// Payment vendor event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
	/// Vendor event id
	pub id: String,
	#[serde(rename = "type")]
	pub event_type: String,
	pub created: i64,
	pub data: PaymentEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
	pub object: PaymentIntentObject,
}

/// The intent object embedded in a payment event
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
	pub id: String,
	pub amount: i64,
	pub currency: String,
	#[serde(default)]
	pub latest_charge: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
}

impl PaymentEvent {
	/// Event types this service acts on
	pub const INTENT_SUCCEEDED: &'static str = "payment_intent.succeeded";
	pub const INTENT_FAILED: &'static str = "payment_intent.payment_failed";

	pub fn is_capture(&self) -> bool {
		self.event_type == Self::INTENT_SUCCEEDED
	}

	pub fn is_failure(&self) -> bool {
		self.event_type == Self::INTENT_FAILED
	}
}

/// Identity provider event (account created/updated hooks)
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
	#[serde(rename = "type")]
	pub event_type: String,
	/// Provider subject (`sub` claim)
	pub user_id: String,
	pub email: String,
	#[serde(default)]
	pub name: Option<String>,
}

impl IdentityEvent {
	pub const USER_CREATED: &'static str = "user.created";
	pub const USER_UPDATED: &'static str = "user.updated";
}

/// Content-store change notification: ids only, handlers re-read what they
/// care about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChangeEvent {
	pub ids: Vec<String>,
	#[serde(rename = "type", default)]
	pub doc_type: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_payment_event_parsing_ignores_unknown_fields() {
		let raw = json!({
			"id": "evt_1",
			"type": "payment_intent.succeeded",
			"created": 1700000000,
			"api_version": "2024-06-20",
			"data": {
				"object": {
					"id": "pi_123",
					"object": "payment_intent",
					"amount": 4500,
					"currency": "usd",
					"latest_charge": "ch_9",
					"status": "succeeded"
				}
			}
		});

		let event: PaymentEvent = serde_json::from_value(raw).unwrap();
		assert!(event.is_capture());
		assert_eq!(event.data.object.id, "pi_123");
		assert_eq!(event.data.object.latest_charge.as_deref(), Some("ch_9"));
	}

	#[test]
	fn test_identity_event_parsing() {
		let raw = json!({
			"type": "user.created",
			"user_id": "auth0|abc",
			"email": "jo@example.com"
		});
		let event: IdentityEvent = serde_json::from_value(raw).unwrap();
		assert_eq!(event.event_type, IdentityEvent::USER_CREATED);
		assert!(event.name.is_none());
	}
}
