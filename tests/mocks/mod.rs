//! Shared fixtures for the integration and e2e suites

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	body::Body,
	http::{Request, StatusCode},
	Router,
};
use commerce_ops::config::ConfigurableValue;
use commerce_ops::mocks::{MockMailer, MockPaymentGateway, MockShippingGateway};
use commerce_ops::{AppState, MemoryStore, OpsBuilder, Product, Settings};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tower::ServiceExt;

pub const PAYMENT_WEBHOOK_SECRET: &str = "whsec_test_payment";
pub const IDENTITY_WEBHOOK_SECRET: &str = "test_identity_secret";

/// Settings with plain test secrets and no rate limiting
pub fn test_settings() -> Settings {
	let mut settings = Settings::default();
	settings.vendors.stripe.webhook_secret = ConfigurableValue::from_plain(PAYMENT_WEBHOOK_SECRET);
	settings.security.identity_webhook_secret =
		ConfigurableValue::from_plain(IDENTITY_WEBHOOK_SECRET);
	settings.environment.rate_limiting.enabled = false;
	settings
}

/// A fully wired application over a memory store and mock gateways
pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub store: MemoryStore,
	pub mailer: Arc<MockMailer>,
}

pub async fn spawn_app() -> TestApp {
	let store = MemoryStore::with_ttl_enabled(false);
	let mailer = Arc::new(MockMailer::new());

	let (router, state) = OpsBuilder::with_storage(store.clone())
		.with_settings(test_settings())
		.with_payment_gateway(Arc::new(MockPaymentGateway::new()))
		.with_shipping_gateway(Arc::new(MockShippingGateway::new()))
		.with_mailer(mailer.clone() as Arc<dyn commerce_ops::Mailer>)
		.start()
		.await
		.expect("test app should start");

	TestApp {
		router,
		state,
		store,
		mailer,
	}
}

pub async fn seed_product(store: &MemoryStore, sku: &str, title: &str, price: i64) -> Product {
	use commerce_ops::traits::ProductStorage;

	let product = Product::new(
		sku.to_string(),
		title.to_string(),
		price,
		"usd".to_string(),
	);
	store.create_product(product.clone()).await.unwrap();
	product
}

fn hmac_hex(secret: &str, payload: &[u8]) -> String {
	let mut mac =
		Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Payment-vendor style signature header: `t=<unix>,v1=<hex>`
pub fn sign_payment_body(body: &str) -> String {
	let timestamp = chrono::Utc::now().timestamp();
	let digest = hmac_hex(
		PAYMENT_WEBHOOK_SECRET,
		format!("{}.{}", timestamp, body).as_bytes(),
	);
	format!("t={},v1={}", timestamp, digest)
}

/// Identity-provider style signature: plain hex HMAC of the body
pub fn sign_identity_body(body: &str) -> String {
	hmac_hex(IDENTITY_WEBHOOK_SECRET, body.as_bytes())
}

/// Send one JSON request through the router and decode the response
pub async fn send_json(
	router: &Router,
	method: &str,
	uri: &str,
	body: Option<Value>,
	headers: &[(&str, &str)],
) -> (StatusCode, Value) {
	let mut builder = Request::builder().method(method).uri(uri);
	for (name, value) in headers {
		builder = builder.header(*name, *value);
	}

	let request = match body {
		Some(json) => builder
			.header("content-type", "application/json")
			.body(Body::from(json.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	};

	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap_or(Value::String(
			String::from_utf8_lossy(&bytes).to_string(),
		))
	};
	(status, value)
}
