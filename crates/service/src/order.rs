//! Order service
//!
//! Reads orders and applies payment webhook events to them.

use std::sync::Arc;

use ops_storage::traits::{DocumentStore, InvoiceStorage, OrderStorage};
use ops_types::chrono::{TimeZone, Utc};
use ops_types::storage::{Page, PageRequest};
use ops_types::{DocId, Invoice, Order, OrderError, OrderStatus, PaymentEvent};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum OrderServiceError {
	#[error("order not found: {0}")]
	NotFound(String),
	#[error("order error: {0}")]
	Order(#[from] OrderError),
	#[error("storage error: {0}")]
	Storage(String),
}

/// What applying a payment event did
#[derive(Debug, Clone)]
pub struct PaymentApplication {
	pub order: Order,
	/// True only on the transition into `Paid`; replays come back false
	pub newly_paid: bool,
}

#[derive(Clone)]
pub struct OrderService {
	storage: Arc<dyn DocumentStore>,
}

impl OrderService {
	pub fn new(storage: Arc<dyn DocumentStore>) -> Self {
		Self { storage }
	}

	/// Retrieve an existing order by id
	pub async fn get_order(&self, order_id: &DocId) -> Result<Option<Order>, OrderServiceError> {
		self.storage
			.get_order(order_id)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))
	}

	/// One id-ordered page of orders
	pub async fn list_orders(&self, page: &PageRequest) -> Result<Page<Order>, OrderServiceError> {
		self.storage
			.list_orders(page)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))
	}

	/// Orders belonging to one customer
	pub async fn orders_for_customer(
		&self,
		customer_id: &DocId,
	) -> Result<Vec<Order>, OrderServiceError> {
		self.storage
			.get_orders_by_customer(customer_id)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))
	}

	/// Issue the invoice document for a freshly paid order. Skipped when one
	/// already exists, which keeps webhook replays from double-invoicing.
	async fn issue_invoice(&self, order: &Order) -> Result<(), OrderServiceError> {
		let existing = self
			.storage
			.get_invoice_by_order(&order.id)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))?;
		if existing.is_some() {
			return Ok(());
		}

		let invoice = Invoice::for_paid_order(order);
		info!("Issuing invoice {} for order {}", invoice.number, order.id);
		self.storage
			.create_invoice(invoice)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))
	}

	/// Apply a payment vendor event to the order owning its intent.
	///
	/// Returns None when no order references the intent (an event for some
	/// other system, or an order created outside this service). Replays are
	/// idempotent: the order stays in its settled state and `newly_paid`
	/// comes back false.
	pub async fn apply_payment_event(
		&self,
		event: &PaymentEvent,
	) -> Result<Option<PaymentApplication>, OrderServiceError> {
		let intent_id = &event.data.object.id;
		let Some(mut order) = self
			.storage
			.get_order_by_intent(intent_id)
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))?
		else {
			warn!("Payment event {} for unknown intent {}", event.id, intent_id);
			return Ok(None);
		};

		let was_paid = order.status == OrderStatus::Paid;

		if event.is_capture() {
			let captured_at = Utc
				.timestamp_opt(event.created, 0)
				.single()
				.unwrap_or_else(Utc::now);
			order.record_capture(
				intent_id,
				event.data.object.latest_charge.clone(),
				captured_at,
			)?;
		} else if event.is_failure() {
			if order.status == OrderStatus::AwaitingPayment {
				order.transition_to(OrderStatus::Cancelled)?;
				info!("Order {} cancelled by failed intent {}", order.id, intent_id);
			} else {
				// A failure event racing a capture changes nothing.
				warn!(
					"Ignoring failed-intent event for order {} in status {:?}",
					order.id, order.status
				);
				return Ok(Some(PaymentApplication {
					order,
					newly_paid: false,
				}));
			}
		} else {
			// Event types this service does not act on
			return Ok(Some(PaymentApplication {
				order,
				newly_paid: false,
			}));
		}

		self.storage
			.update_order(order.clone())
			.await
			.map_err(|e| OrderServiceError::Storage(e.to_string()))?;

		let newly_paid = !was_paid && order.status == OrderStatus::Paid;
		if newly_paid {
			info!("Order {} paid via intent {}", order.id, intent_id);
			self.issue_invoice(&order).await?;
		}

		Ok(Some(PaymentApplication { order, newly_paid }))
	}
}
