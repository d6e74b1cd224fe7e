//! Order response models for the API layer

use chrono::Utc;
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use super::{LineItem, Order, OrderStatus};

/// API representation of one order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
	pub order_id: String,
	pub order_number: String,
	pub status: OrderStatus,
	pub line_items: Vec<LineItem>,
	pub total: i64,
	pub currency: String,
	/// Vendor payment-intent id, when a payment exists
	#[serde(skip_serializing_if = "Option::is_none")]
	pub payment_intent_id: Option<String>,
	pub email_sent: bool,
	pub created_at: i64,
	pub updated_at: i64,
}

impl From<&Order> for OrderResponse {
	fn from(order: &Order) -> Self {
		Self {
			order_id: order.id.to_string(),
			order_number: order.order_number.clone(),
			status: order.status,
			line_items: order.line_items.clone(),
			total: order.total,
			currency: order.currency.clone(),
			payment_intent_id: order.payment.as_ref().map(|p| p.intent_id.clone()),
			email_sent: order.email_sent,
			created_at: order.created_at.timestamp(),
			updated_at: order.updated_at.timestamp(),
		}
	}
}

/// One page of orders plus the cursor to fetch the next
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OrdersPageResponse {
	pub orders: Vec<OrderResponse>,
	pub total_returned: usize,
	/// Pass back as `after` to continue; absent on the last page
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_cursor: Option<String>,
	pub timestamp: i64,
}

impl OrdersPageResponse {
	pub fn from_page(orders: Vec<Order>, next_cursor: Option<String>) -> Self {
		let responses: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
		Self {
			total_returned: responses.len(),
			orders: responses,
			next_cursor,
			timestamp: Utc::now().timestamp(),
		}
	}
}
