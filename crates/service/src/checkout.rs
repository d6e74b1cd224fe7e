//! Checkout service
//!
//! Validates a cart, resolves products, creates the payment intent, and
//! persists the order in one pass. The vendor idempotency key is the order
//! id, so a retried checkout reuses the same intent instead of double
//! charging.

use std::sync::Arc;

use ops_storage::traits::{CustomerStorage, DocumentStore, OrderStorage, ProductStorage};
use ops_types::chrono::Utc;
use ops_types::{
	CheckoutRequest, CreateIntentParams, Customer, GatewayError, LineItem, Order, OrderStatus,
	OrderValidationError, PaymentGateway, PaymentMeta,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CheckoutError {
	#[error("validation error: {0}")]
	Validation(#[from] OrderValidationError),
	#[error("payment gateway error: {0}")]
	Gateway(#[from] GatewayError),
	#[error("storage error: {0}")]
	Storage(String),
}

#[derive(Clone)]
pub struct CheckoutService {
	storage: Arc<dyn DocumentStore>,
	payments: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
	pub fn new(storage: Arc<dyn DocumentStore>, payments: Arc<dyn PaymentGateway>) -> Self {
		Self { storage, payments }
	}

	/// Validate, price, create the payment intent, and persist the order
	pub async fn submit_checkout(&self, request: &CheckoutRequest) -> Result<Order, CheckoutError> {
		// 1. Shape validation before any storage or vendor call
		request.validate()?;

		// 2. Upsert the customer by email
		let customer = match self
			.storage
			.get_customer_by_email(&request.email)
			.await
			.map_err(|e| CheckoutError::Storage(e.to_string()))?
		{
			Some(existing) => existing,
			None => {
				let mut customer = Customer::new(request.email.clone());
				if let Some(name) = &request.name {
					customer = customer.with_name(name.clone());
				}
				self.storage
					.create_customer(customer.clone())
					.await
					.map_err(|e| CheckoutError::Storage(e.to_string()))?;
				customer
			},
		};

		// 3. Resolve every sku against the catalog
		let mut line_items = Vec::with_capacity(request.items.len());
		for item in &request.items {
			let product = self
				.storage
				.get_product_by_sku(&item.sku)
				.await
				.map_err(|e| CheckoutError::Storage(e.to_string()))?
				.ok_or_else(|| OrderValidationError::UnknownSku {
					sku: item.sku.clone(),
				})?;

			if !product.active {
				return Err(OrderValidationError::InactiveProduct {
					sku: item.sku.clone(),
				}
				.into());
			}
			if product.currency != request.currency {
				return Err(OrderValidationError::CurrencyMismatch {
					cart: request.currency.clone(),
					sku: item.sku.clone(),
					product: product.currency.clone(),
				}
				.into());
			}

			line_items.push(LineItem {
				product: Some(product.id.clone()),
				sku: product.sku,
				title: product.title,
				quantity: item.quantity,
				unit_price: product.price,
			});
		}

		// 4. Build the order before calling the vendor so its id can serve
		// as the idempotency key
		let order_number = self.next_order_number().await?;
		let mut order = Order::new(order_number, request.currency.clone())
			.with_customer(customer.id.clone())
			.with_line_items(line_items);

		// 5. Create the payment intent
		let intent = self
			.payments
			.create_intent(&CreateIntentParams {
				amount: order.total,
				currency: order.currency.clone(),
				idempotency_key: order.id.to_string(),
				receipt_email: Some(customer.email.clone()),
				metadata: vec![
					("order_id".to_string(), order.id.to_string()),
					("order_number".to_string(), order.order_number.clone()),
				],
			})
			.await?;

		// 6. Record the intent and persist
		order = order.with_payment(PaymentMeta {
			intent_id: intent.intent_id.clone(),
			charge_id: intent.latest_charge_id.clone(),
			amount: intent.amount,
			currency: intent.currency.clone(),
			captured_at: None,
		});
		order.status = OrderStatus::AwaitingPayment;
		order.updated_at = Utc::now();

		self.storage
			.create_order(order.clone())
			.await
			.map_err(|e| CheckoutError::Storage(e.to_string()))?;

		info!(
			"Created order {} ({}) with intent {}",
			order.order_number, order.id, intent.intent_id
		);
		Ok(order)
	}

	/// Sequential-looking order numbers; collisions only matter for humans,
	/// the document id is the real key.
	async fn next_order_number(&self) -> Result<String, CheckoutError> {
		let count = self
			.storage
			.order_count()
			.await
			.map_err(|e| CheckoutError::Storage(e.to_string()))
			.unwrap_or_else(|e| {
				warn!("Falling back to zero-based order number: {}", e);
				0
			});
		Ok(format!("SO-{}", 1000 + count as u64 + 1))
	}
}
