//! Notification service
//!
//! Sends the order-confirmation email and records that it was sent, so a
//! replayed payment webhook never mails the customer twice.

use std::sync::Arc;

use ops_storage::traits::{CustomerStorage, DocumentStore, OrderStorage};
use ops_types::chrono::Utc;
use ops_types::{GatewayError, Mailer, Order, OutboundEmail};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("mail gateway error: {0}")]
	Gateway(#[from] GatewayError),
	#[error("order has no customer email")]
	NoRecipient,
	#[error("storage error: {0}")]
	Storage(String),
}

#[derive(Clone)]
pub struct NotifyService {
	storage: Arc<dyn DocumentStore>,
	mailer: Arc<dyn Mailer>,
	from_address: String,
}

impl NotifyService {
	pub fn new(storage: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>, from_address: String) -> Self {
		Self {
			storage,
			mailer,
			from_address,
		}
	}

	/// Send the confirmation email for a paid order, at most once.
	///
	/// Returns the vendor message id, or None when the order was already
	/// notified.
	pub async fn send_order_confirmation(
		&self,
		order: &Order,
	) -> Result<Option<String>, NotifyError> {
		if order.email_sent {
			return Ok(None);
		}

		let recipient = match &order.customer {
			Some(customer_id) => self
				.storage
				.get_customer(customer_id)
				.await
				.map_err(|e| NotifyError::Storage(e.to_string()))?
				.map(|c| c.email),
			None => None,
		};
		let recipient = recipient.ok_or(NotifyError::NoRecipient)?;

		let email = OutboundEmail::new(
			self.from_address.clone(),
			recipient,
			format!("Order {} confirmed", order.order_number),
			render_confirmation(order),
		);

		let message_id = self.mailer.send(&email).await?;
		info!(
			"Sent confirmation for order {} (message {})",
			order.order_number, message_id
		);

		// Mark before returning; a lost mark means one duplicate email on
		// the next replay, which beats losing the send entirely.
		let mut updated = order.clone();
		updated.email_sent = true;
		updated.updated_at = Utc::now();
		if let Err(e) = self.storage.update_order(updated).await {
			warn!(
				"Failed to mark order {} as notified: {}",
				order.order_number, e
			);
		}

		Ok(Some(message_id))
	}
}

/// Minimal HTML body; templating belongs to the storefront, not here
fn render_confirmation(order: &Order) -> String {
	let mut rows = String::new();
	for item in &order.line_items {
		rows.push_str(&format!(
			"<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
			item.title, item.quantity, format_minor(item.subtotal(), &order.currency)
		));
	}
	format!(
		"<h1>Thanks for your order {}</h1><table>{}</table><p>Total: {}</p>",
		order.order_number,
		rows,
		format_minor(order.total, &order.currency)
	)
}

fn format_minor(amount: i64, currency: &str) -> String {
	format!("{}.{:02} {}", amount / 100, (amount % 100).abs(), currency.to_uppercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use ops_storage::MemoryStore;
	use ops_types::{Customer, GatewayResult, LineItem};
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Debug, Default)]
	struct CountingMailer {
		sent: AtomicUsize,
	}

	#[async_trait]
	impl Mailer for CountingMailer {
		async fn send(&self, _email: &OutboundEmail) -> GatewayResult<String> {
			self.sent.fetch_add(1, Ordering::SeqCst);
			Ok("msg_1".to_string())
		}

		async fn health_check(&self) -> GatewayResult<bool> {
			Ok(true)
		}

		fn name(&self) -> &str {
			"counting"
		}
	}

	async fn seeded(store: &MemoryStore) -> Order {
		let customer = Customer::new("jo@example.com".to_string());
		store.create_customer(customer.clone()).await.unwrap();

		let order = Order::new("SO-1001".to_string(), "usd".to_string())
			.with_customer(customer.id)
			.with_line_items(vec![LineItem {
				product: None,
				sku: "MUG-01".to_string(),
				title: "Mug".to_string(),
				quantity: 2,
				unit_price: 1250,
			}]);
		store.create_order(order.clone()).await.unwrap();
		order
	}

	#[tokio::test]
	async fn test_confirmation_sent_once() {
		let store = Arc::new(MemoryStore::new());
		let mailer = Arc::new(CountingMailer::default());
		let service = NotifyService::new(
			store.clone(),
			mailer.clone(),
			"orders@example.com".to_string(),
		);

		let order = seeded(&store).await;
		let first = service.send_order_confirmation(&order).await.unwrap();
		assert_eq!(first.as_deref(), Some("msg_1"));

		// Reload: email_sent now true, replay sends nothing
		let reloaded = store.get_order(&order.id).await.unwrap().unwrap();
		let second = service.send_order_confirmation(&reloaded).await.unwrap();
		assert!(second.is_none());
		assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_minor_unit_formatting() {
		assert_eq!(format_minor(4500, "usd"), "45.00 USD");
		assert_eq!(format_minor(895, "usd"), "8.95 USD");
	}
}
