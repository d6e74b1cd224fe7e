//! Invoice document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DocId;
use crate::orders::Order;

/// Invoice document, issued when an order's payment is captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	pub order: DocId,
	/// Human-facing invoice number, derived from the order number
	pub number: String,
	/// Amount due in minor currency units; zero once captured
	pub amount_due: i64,
	pub currency: String,
	pub issued_at: DateTime<Utc>,
	/// Rendered document, when the PDF service has produced one
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pdf_url: Option<String>,
}

impl Invoice {
	/// Issue an invoice for a captured order. The amount due is zero: this
	/// records the settled charge, it does not request payment.
	pub fn for_paid_order(order: &Order) -> Self {
		Self {
			id: DocId::random_with_prefix("invoice"),
			rev: None,
			order: order.id.clone(),
			number: format!("INV-{}", order.order_number.trim_start_matches("SO-")),
			amount_due: 0,
			currency: order.currency.clone(),
			issued_at: Utc::now(),
			pdf_url: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invoice_number_follows_order_number() {
		let order = Order::new("SO-1042".to_string(), "usd".to_string());
		let invoice = Invoice::for_paid_order(&order);
		assert_eq!(invoice.number, "INV-1042");
		assert_eq!(invoice.order, order.id);
		assert_eq!(invoice.amount_due, 0);
	}
}
