use std::sync::Arc;

use ops_service::{
	CheckoutService, DrainService, NotifyService, OrderService, RequestLogService,
	ShippingService, SignatureTrait,
};
use ops_storage::DocumentStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
	pub checkout_service: Arc<CheckoutService>,
	pub order_service: Arc<OrderService>,
	pub shipping_service: Arc<ShippingService>,
	pub notify_service: Arc<NotifyService>,
	pub drain_service: Arc<DrainService>,
	pub request_logs: Arc<RequestLogService>,
	/// Verifies the payment vendor's timestamped signature header
	pub payment_signatures: Arc<dyn SignatureTrait>,
	/// Verifies the identity provider's plain HMAC header
	pub identity_signatures: Arc<dyn SignatureTrait>,
	pub storage: Arc<dyn DocumentStore>,
}
