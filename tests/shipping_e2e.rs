//! End-to-end tests for the shipping surface

mod mocks;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use commerce_ops::traits::QuoteStorage;
use commerce_ops::{DocId, ShippingQuote};
use mocks::{seed_product, send_json, spawn_app, TestApp};

async fn checkout_order(app: &TestApp) -> String {
	seed_product(&app.store, "MUG-01", "Mug", 1250).await;
	let request = json!({
		"email": "jo@example.com",
		"items": [{"sku": "MUG-01", "quantity": 1}],
		"currency": "usd"
	});
	let (status, body) =
		send_json(&app.router, "POST", "/api/v1/checkout", Some(request), &[]).await;
	assert_eq!(status, StatusCode::OK);
	body["orderId"].as_str().unwrap().to_string()
}

fn ship_to() -> serde_json::Value {
	json!({
		"name": "Jo Smith",
		"line1": "1 Main St",
		"city": "Portland",
		"state": "OR",
		"postalCode": "97201",
		"country": "US"
	})
}

#[tokio::test]
async fn test_rates_are_stored_as_quotes() {
	let app = spawn_app().await;
	let order_id = checkout_order(&app).await;

	let request = json!({
		"orderId": order_id.clone(),
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (status, body) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/rates",
		Some(request),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["totalQuotes"], 2);

	let stored = app
		.store
		.get_quotes_for_order(&DocId::new(order_id))
		.await
		.unwrap();
	assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_rates_for_missing_order_404() {
	let app = spawn_app().await;

	let request = json!({
		"orderId": "order.nope",
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (status, body) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/rates",
		Some(request),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_label_purchase_creates_shipment() {
	let app = spawn_app().await;
	let order_id = checkout_order(&app).await;

	let request = json!({
		"orderId": order_id.clone(),
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (_, rates) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/rates",
		Some(request),
		&[],
	)
	.await;
	let quote_id = rates["quotes"][0]["id"].as_str().unwrap().to_string();

	let request = json!({
		"orderId": order_id,
		"quoteId": quote_id,
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (status, shipment) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/labels",
		Some(request),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert!(shipment["tracking_number"]
		.as_str()
		.unwrap()
		.starts_with("TRK"));

	// Tracking refresh works against the created shipment
	let shipment_id = shipment["id"].as_str().unwrap();
	let (status, tracking) = send_json(
		&app.router,
		"GET",
		&format!("/api/v1/shipments/{}/tracking", shipment_id),
		None,
		&[],
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(tracking["status"], "InTransit");
}

#[tokio::test]
async fn test_expired_quote_is_rejected_not_repriced() {
	let app = spawn_app().await;
	let order_id = checkout_order(&app).await;

	let quote = ShippingQuote::new(
		DocId::new(order_id.clone()),
		"mock-usps".to_string(),
		"usps_priority".to_string(),
		895,
		"usd".to_string(),
	)
	.with_ttl(Duration::minutes(-1));
	let quote_id = quote.id.to_string();
	app.store.add_quote(quote).await.unwrap();

	let request = json!({
		"orderId": order_id,
		"quoteId": quote_id,
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (status, body) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/labels",
		Some(request),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "QUOTE_EXPIRED");
}

#[tokio::test]
async fn test_quote_for_another_order_is_rejected() {
	let app = spawn_app().await;
	let order_id = checkout_order(&app).await;

	let quote = ShippingQuote::new(
		DocId::new("order.someone-else"),
		"mock-usps".to_string(),
		"usps_priority".to_string(),
		895,
		"usd".to_string(),
	);
	let quote_id = quote.id.to_string();
	app.store.add_quote(quote).await.unwrap();

	let request = json!({
		"orderId": order_id,
		"quoteId": quote_id,
		"shipTo": ship_to(),
		"parcel": {"weightGrams": 500}
	});
	let (status, body) = send_json(
		&app.router,
		"POST",
		"/api/v1/shipping/labels",
		Some(request),
		&[],
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "QUOTE_ORDER_MISMATCH");
}
