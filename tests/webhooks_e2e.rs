//! End-to-end tests for the inbound webhook surface

mod mocks;

use axum::http::StatusCode;
use serde_json::json;

use commerce_ops::traits::{CustomerStorage, InvoiceStorage, QuoteStorage};
use commerce_ops::{DocId, ShippingQuote};
use mocks::{seed_product, send_json, sign_identity_body, sign_payment_body, spawn_app, TestApp};

/// Checkout an order and return (order_id, intent_id)
async fn checkout_order(app: &TestApp) -> (String, String) {
	seed_product(&app.store, "MUG-01", "Mug", 1250).await;
	let request = json!({
		"email": "jo@example.com",
		"items": [{"sku": "MUG-01", "quantity": 1}],
		"currency": "usd"
	});
	let (status, body) =
		send_json(&app.router, "POST", "/api/v1/checkout", Some(request), &[]).await;
	assert_eq!(status, StatusCode::OK);
	(
		body["orderId"].as_str().unwrap().to_string(),
		body["paymentIntentId"].as_str().unwrap().to_string(),
	)
}

fn capture_event_body(intent_id: &str) -> String {
	json!({
		"id": "evt_1",
		"type": "payment_intent.succeeded",
		"created": chrono::Utc::now().timestamp(),
		"data": {"object": {
			"id": intent_id,
			"amount": 1250,
			"currency": "usd",
			"latest_charge": "ch_1"
		}}
	})
	.to_string()
}

#[tokio::test]
async fn test_payment_webhook_rejects_missing_signature() {
	let app = spawn_app().await;

	let (status, body) = send_json(
		&app.router,
		"POST",
		"/webhooks/payments",
		Some(json!({"id": "evt_x"})),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "SIGNATURE_MISSING");
}

#[tokio::test]
async fn test_payment_webhook_rejects_bad_signature() {
	let app = spawn_app().await;
	let body_text = capture_event_body("pi_whatever");

	let (status, body) = send_json(
		&app.router,
		"POST",
		"/webhooks/payments",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("stripe-signature", "t=1,v1=deadbeef")],
	)
	.await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "SIGNATURE_INVALID");
}

#[tokio::test]
async fn test_payment_capture_marks_order_paid_and_emails_once() {
	let app = spawn_app().await;
	let (order_id, intent_id) = checkout_order(&app).await;

	let body_text = capture_event_body(&intent_id);
	let signature = sign_payment_body(&body_text);

	// The signed raw body must be byte-identical to what we send; build the
	// request from the exact string.
	let (status, ack) = send_json(
		&app.router,
		"POST",
		"/webhooks/payments",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("stripe-signature", &signature)],
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(ack["received"], true);

	let (_, order) = send_json(
		&app.router,
		"GET",
		&format!("/api/v1/orders/{}", order_id),
		None,
		&[],
	)
	.await;
	assert_eq!(order["status"], "paid");
	assert_eq!(order["emailSent"], true);
	assert_eq!(app.mailer.sent_count(), 1);

	// An invoice was issued for the captured order
	let invoice = app
		.store
		.get_invoice_by_order(&commerce_ops::DocId::new(order_id.clone()))
		.await
		.unwrap()
		.expect("invoice issued on capture");
	assert!(invoice.number.starts_with("INV-"));

	// Replay: acknowledged, still paid, no second email, no second invoice
	let signature = sign_payment_body(&body_text);
	let (status, _) = send_json(
		&app.router,
		"POST",
		"/webhooks/payments",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("stripe-signature", &signature)],
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(app.mailer.sent_count(), 1);
	assert_eq!(app.store.invoice_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_payment_event_for_unknown_intent_is_acknowledged() {
	let app = spawn_app().await;

	let body_text = capture_event_body("pi_not_ours");
	let signature = sign_payment_body(&body_text);
	let (status, ack) = send_json(
		&app.router,
		"POST",
		"/webhooks/payments",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("stripe-signature", &signature)],
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(ack["received"], true);
}

#[tokio::test]
async fn test_identity_webhook_upserts_customer() {
	let app = spawn_app().await;

	let body_text = json!({
		"type": "user.created",
		"user_id": "auth0|abc123",
		"email": "new@example.com",
		"name": "New Shopper"
	})
	.to_string();
	let signature = sign_identity_body(&body_text);

	let (status, _) = send_json(
		&app.router,
		"POST",
		"/webhooks/identity",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("x-webhook-signature", &signature)],
	)
	.await;
	assert_eq!(status, StatusCode::OK);

	let customer = app
		.store
		.get_customer_by_subject("auth0|abc123")
		.await
		.unwrap()
		.expect("customer should exist");
	assert_eq!(customer.email, "new@example.com");
	assert_eq!(customer.name.as_deref(), Some("New Shopper"));

	// Update event on the same subject patches in place
	let body_text = json!({
		"type": "user.updated",
		"user_id": "auth0|abc123",
		"email": "renamed@example.com"
	})
	.to_string();
	let signature = sign_identity_body(&body_text);
	let (status, _) = send_json(
		&app.router,
		"POST",
		"/webhooks/identity",
		Some(serde_json::from_str(&body_text).unwrap()),
		&[("x-webhook-signature", &signature)],
	)
	.await;
	assert_eq!(status, StatusCode::OK);

	let updated = app
		.store
		.get_customer_by_subject("auth0|abc123")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(updated.email, "renamed@example.com");
	assert_eq!(updated.id, customer.id);
}

#[tokio::test]
async fn test_identity_webhook_rejects_unsigned_payload() {
	let app = spawn_app().await;

	let (status, _) = send_json(
		&app.router,
		"POST",
		"/webhooks/identity",
		Some(json!({"type": "user.created", "user_id": "x", "email": "x@example.com"})),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_content_webhook_invalidates_stored_quotes() {
	let app = spawn_app().await;
	let (order_id, _) = checkout_order(&app).await;

	let quote = ShippingQuote::new(
		DocId::new(order_id.clone()),
		"usps".to_string(),
		"usps_priority".to_string(),
		895,
		"usd".to_string(),
	);
	app.store.add_quote(quote).await.unwrap();

	let (status, ack) = send_json(
		&app.router,
		"POST",
		"/webhooks/content",
		Some(json!({"ids": [order_id.clone()], "type": "order"})),
		&[],
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(ack["received"], true);

	let remaining = app
		.store
		.get_quotes_for_order(&DocId::new(order_id))
		.await
		.unwrap();
	assert!(remaining.is_empty());
}
