//! OpenAPI document definition (behind the `openapi` feature)

use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
	paths(
		handlers::health::health,
		handlers::health::ready,
		handlers::checkout::post_checkout,
		handlers::orders::get_order,
		handlers::orders::get_orders,
		handlers::shipping::post_rates,
		handlers::shipping::post_labels,
		handlers::shipping::get_tracking,
		handlers::webhooks::post_payment_webhook,
		handlers::webhooks::post_identity_webhook,
		handlers::webhooks::post_content_webhook,
		handlers::ops::post_drain_flush,
	),
	tags(
		(name = "health", description = "Liveness and readiness"),
		(name = "checkout", description = "Cart checkout"),
		(name = "orders", description = "Order reads"),
		(name = "shipping", description = "Rates, labels, tracking"),
		(name = "webhooks", description = "Inbound vendor webhooks"),
		(name = "ops", description = "Administrative operations"),
	)
)]
pub struct ApiDoc;
