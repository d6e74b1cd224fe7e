//! Core Order document model and business logic

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub mod errors;
pub mod legacy;
pub mod request;
pub mod response;

pub use errors::{OrderError, OrderValidationError};
pub use legacy::{
	canonicalize_line_items, CanonicalizeOutcome, LegacyCartShape, CANONICAL_ITEMS_FIELD,
};
pub use request::{CartItemInput, CheckoutRequest};
pub use response::{OrderResponse, OrdersPageResponse};

use crate::models::DocId;

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

/// Result type for order validation operations
pub type OrderValidationResult<T> = Result<T, OrderValidationError>;

/// Core Order document
///
/// Canonical shape of an order in the content store. Historical documents may
/// still carry legacy cart fields; the backfill jobs in the service crate
/// rewrite those into `line_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Document id (`order.<uuid>` for documents we create)
	pub id: DocId,

	/// Store revision of the last read, used for optimistic patching
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,

	/// Human-facing order number, e.g. `SO-10412`
	pub order_number: String,

	/// Reference to the customer document
	pub customer: Option<DocId>,

	/// Canonical cart contents
	pub line_items: Vec<LineItem>,

	/// Order lifecycle status
	pub status: OrderStatus,

	/// Payment details, present once a payment intent exists
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentMeta>,

	/// Reference to the shipping quote selected for this order, if any
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shipping_quote: Option<DocId>,

	/// Whether the confirmation email has been sent
	#[serde(default)]
	pub email_sent: bool,

	/// Order total in minor currency units
	pub total: i64,

	/// ISO 4217 currency code
	pub currency: String,

	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A single cart line on an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LineItem {
	/// Reference to the product document
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product: Option<DocId>,

	pub sku: String,

	pub title: String,

	pub quantity: u32,

	/// Unit price in minor currency units
	pub unit_price: i64,
}

impl LineItem {
	pub fn subtotal(&self) -> i64 {
		self.unit_price * i64::from(self.quantity)
	}
}

/// Payment details recorded against an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMeta {
	/// Vendor payment-intent id
	pub intent_id: String,

	/// Vendor charge id, present after capture
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub charge_id: Option<String>,

	/// Amount in minor currency units
	pub amount: i64,

	pub currency: String,

	/// When the payment was captured
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub captured_at: Option<DateTime<Utc>>,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum OrderStatus {
	/// Order document exists but checkout has not completed
	Pending,
	/// Payment intent created, waiting on the payment webhook
	AwaitingPayment,
	/// Payment captured
	Paid,
	/// Label purchased and shipment created
	Fulfilled,
	/// Cancelled before payment, or payment failed
	Cancelled,
	/// Payment refunded after capture
	Refunded,
}

impl OrderStatus {
	/// Whether a transition from `self` to `next` is allowed
	pub fn can_transition_to(&self, next: OrderStatus) -> bool {
		use OrderStatus::*;
		matches!(
			(self, next),
			(Pending, AwaitingPayment)
				| (Pending, Cancelled)
				| (AwaitingPayment, Paid)
				| (AwaitingPayment, Cancelled)
				| (Paid, Fulfilled)
				| (Paid, Refunded)
				| (Fulfilled, Refunded)
		)
	}
}

impl Order {
	/// Create a new pending order with no line items
	pub fn new(order_number: String, currency: String) -> Self {
		let now = Utc::now();
		Self {
			id: DocId::random_with_prefix("order"),
			rev: None,
			order_number,
			customer: None,
			line_items: Vec::new(),
			status: OrderStatus::Pending,
			payment: None,
			shipping_quote: None,
			email_sent: false,
			total: 0,
			currency,
			created_at: now,
			updated_at: now,
		}
	}

	/// Sum of line subtotals in minor units
	pub fn line_total(&self) -> i64 {
		self.line_items.iter().map(LineItem::subtotal).sum()
	}

	/// Move to a new status, validating the transition
	pub fn transition_to(&mut self, next: OrderStatus) -> OrderResult<()> {
		if self.status == next {
			// Webhook replays land here; staying put is not an error.
			return Ok(());
		}
		if !self.status.can_transition_to(next) {
			return Err(OrderError::InvalidTransition {
				from: self.status,
				to: next,
			});
		}
		self.status = next;
		self.updated_at = Utc::now();
		Ok(())
	}

	/// Record a captured payment. Idempotent for replays of the same intent.
	pub fn record_capture(
		&mut self,
		intent_id: &str,
		charge_id: Option<String>,
		captured_at: DateTime<Utc>,
	) -> OrderResult<()> {
		let payment = self
			.payment
			.as_mut()
			.ok_or_else(|| OrderError::PaymentMissing {
				order_id: self.id.to_string(),
			})?;
		if payment.intent_id != intent_id {
			return Err(OrderError::IntentMismatch {
				expected: payment.intent_id.clone(),
				got: intent_id.to_string(),
			});
		}
		if self.status == OrderStatus::Paid {
			return Ok(());
		}
		payment.charge_id = charge_id;
		payment.captured_at = Some(captured_at);
		self.transition_to(OrderStatus::Paid)
	}

	pub fn with_customer(mut self, customer: DocId) -> Self {
		self.customer = Some(customer);
		self
	}

	pub fn with_line_items(mut self, items: Vec<LineItem>) -> Self {
		self.total = items.iter().map(LineItem::subtotal).sum();
		self.line_items = items;
		self
	}

	pub fn with_payment(mut self, payment: PaymentMeta) -> Self {
		self.payment = Some(payment);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_order() -> Order {
		Order::new("SO-1001".to_string(), "usd".to_string()).with_line_items(vec![
			LineItem {
				product: Some(DocId::new("product.mug")),
				sku: "MUG-01".to_string(),
				title: "Mug".to_string(),
				quantity: 2,
				unit_price: 1250,
			},
			LineItem {
				product: Some(DocId::new("product.tee")),
				sku: "TEE-01".to_string(),
				title: "T-shirt".to_string(),
				quantity: 1,
				unit_price: 2000,
			},
		])
	}

	#[test]
	fn test_totals() {
		let order = test_order();
		assert_eq!(order.line_total(), 4500);
		assert_eq!(order.total, 4500);
	}

	#[test]
	fn test_status_transitions() {
		let mut order = test_order();
		assert!(order.transition_to(OrderStatus::AwaitingPayment).is_ok());
		assert!(order.transition_to(OrderStatus::Paid).is_ok());
		assert!(order.transition_to(OrderStatus::Fulfilled).is_ok());

		// Fulfilled orders cannot go back to pending
		assert!(order.transition_to(OrderStatus::Pending).is_err());
	}

	#[test]
	fn test_transition_to_same_status_is_noop() {
		let mut order = test_order();
		order.transition_to(OrderStatus::AwaitingPayment).unwrap();
		assert!(order.transition_to(OrderStatus::AwaitingPayment).is_ok());
	}

	#[test]
	fn test_record_capture_is_idempotent() {
		let mut order = test_order().with_payment(PaymentMeta {
			intent_id: "pi_123".to_string(),
			charge_id: None,
			amount: 4500,
			currency: "usd".to_string(),
			captured_at: None,
		});
		order.transition_to(OrderStatus::AwaitingPayment).unwrap();

		let now = Utc::now();
		order
			.record_capture("pi_123", Some("ch_1".to_string()), now)
			.unwrap();
		assert_eq!(order.status, OrderStatus::Paid);

		// Replay of the same event keeps the order paid
		order
			.record_capture("pi_123", Some("ch_1".to_string()), now)
			.unwrap();
		assert_eq!(order.status, OrderStatus::Paid);
	}

	#[test]
	fn test_record_capture_rejects_foreign_intent() {
		let mut order = test_order().with_payment(PaymentMeta {
			intent_id: "pi_123".to_string(),
			charge_id: None,
			amount: 4500,
			currency: "usd".to_string(),
			captured_at: None,
		});
		order.transition_to(OrderStatus::AwaitingPayment).unwrap();

		let err = order
			.record_capture("pi_999", None, Utc::now())
			.unwrap_err();
		assert!(matches!(err, OrderError::IntentMismatch { .. }));
	}
}
