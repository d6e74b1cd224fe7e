//! End-to-end tests for the order backfill machinery
//!
//! Seeds the document store with the historical shapes the jobs were built
//! for and checks the canonical result, idempotence, and the counts the
//! reports carry.

mod mocks;

use std::sync::Arc;

use commerce_ops::service::backfill::{
	standard_jobs, BackfillOptions, BackfillRunner, CartItemsJob, OrderRefsJob, PaymentMetaJob,
};
use commerce_ops::traits::{OrderStorage, ProductStorage};
use commerce_ops::{DocId, MemoryStore, OrderStatus, Product};
use serde_json::json;

use mocks::spawn_app;

/// The three historical shapes, one document each
fn seed_legacy_orders(store: &MemoryStore) {
	// Oldest shape: `items` with major-unit float prices
	store.seed_raw(
		&DocId::new("order.0001"),
		json!({
			"id": "order.0001",
			"order_number": "SO-1",
			"status": "pending",
			"currency": "usd",
			"created_at": "2021-03-01T10:00:00Z",
			"updated_at": "2021-03-01T10:00:00Z",
			"items": [
				{"sku": "MUG-01", "name": "Mug", "qty": 2, "price": 12.5},
				{"sku": "MUG-01", "name": "Mug", "qty": 1, "price": 12.5}
			]
		}),
	);
	// Interim cart service shape, with a broken product reference
	store.seed_raw(
		&DocId::new("order.0002"),
		json!({
			"id": "order.0002",
			"order_number": "SO-2",
			"status": "paid",
			"currency": "usd",
			"created_at": "2022-06-01T10:00:00Z",
			"updated_at": "2022-06-01T10:00:00Z",
			"cartItems": [
				{"product": {"_ref": "product.deleted"}, "sku": "TEE-01", "title": "Tee", "quantity": 1, "unitPrice": 2000}
			],
			"paymentIntentId": "pi_legacy_2"
		}),
	);
	// Old studio camelCase shape
	store.seed_raw(
		&DocId::new("order.0003"),
		json!({
			"id": "order.0003",
			"order_number": "SO-3",
			"status": "pending",
			"currency": "usd",
			"created_at": "2023-01-01T10:00:00Z",
			"updated_at": "2023-01-01T10:00:00Z",
			"lineItems": [
				{"sku": "TEE-01", "title": "Tee", "quantity": 2, "unit_price": 2000}
			]
		}),
	);
}

async fn seed_catalog(store: &MemoryStore) -> (Product, Product) {
	let mug = Product::new("MUG-01".to_string(), "Mug".to_string(), 1250, "usd".to_string());
	let tee = Product::new("TEE-01".to_string(), "Tee".to_string(), 2000, "usd".to_string());
	store.create_product(mug.clone()).await.unwrap();
	store.create_product(tee.clone()).await.unwrap();
	(mug, tee)
}

#[tokio::test]
async fn test_full_backfill_pipeline_canonicalizes_every_shape() {
	let store = MemoryStore::with_ttl_enabled(false);
	seed_legacy_orders(&store);
	seed_catalog(&store).await;

	let runner = BackfillRunner::new(Arc::new(store.clone()));
	for job in standard_jobs() {
		let report = runner.run(job.as_ref(), &BackfillOptions::default()).await;
		assert_eq!(report.failed, 0, "job {} failed", report.job);
	}

	// Every document now deserializes as a canonical order
	for id in ["order.0001", "order.0002", "order.0003"] {
		let order = store
			.get_order(&DocId::new(id))
			.await
			.unwrap()
			.unwrap_or_else(|| panic!("{} should be canonical", id));
		assert!(!order.line_items.is_empty(), "{} has line items", id);
		for item in &order.line_items {
			assert!(item.product.is_some(), "{} item has a product ref", id);
		}
	}

	// Duplicate skus were merged with quantities summed
	let first = store.get_order(&DocId::new("order.0001")).await.unwrap().unwrap();
	assert_eq!(first.line_items.len(), 1);
	assert_eq!(first.line_items[0].quantity, 3);
	assert_eq!(first.total, 3750);

	// The legacy intent id became a payment block
	let second = store.get_order(&DocId::new("order.0002")).await.unwrap().unwrap();
	let payment = second.payment.expect("payment block seeded");
	assert_eq!(payment.intent_id, "pi_legacy_2");
	assert_eq!(second.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_pipeline_is_idempotent_end_to_end() {
	let store = MemoryStore::with_ttl_enabled(false);
	seed_legacy_orders(&store);
	seed_catalog(&store).await;

	let runner = BackfillRunner::new(Arc::new(store.clone()));
	for job in standard_jobs() {
		runner.run(job.as_ref(), &BackfillOptions::default()).await;
	}

	// Second pass over canonical data patches nothing
	for job in standard_jobs() {
		let report = runner.run(job.as_ref(), &BackfillOptions::default()).await;
		assert_eq!(report.matched, 0, "job {} re-matched", report.job);
		assert_eq!(report.patched, 0, "job {} re-patched", report.job);
	}
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
	let store = MemoryStore::with_ttl_enabled(false);
	seed_legacy_orders(&store);

	let runner = BackfillRunner::new(Arc::new(store.clone()));
	let report = runner
		.run(
			&CartItemsJob,
			&BackfillOptions {
				dry_run: true,
				..BackfillOptions::default()
			},
		)
		.await;

	assert!(report.dry_run);
	assert_eq!(report.scanned, 3);
	assert_eq!(report.matched, 3);
	assert_eq!(report.patched, 0);

	// Documents untouched: the legacy field is still there
	let raw = store
		.list_raw_orders(&commerce_ops::models::PageRequest::default())
		.await
		.unwrap();
	assert!(raw
		.items
		.iter()
		.any(|doc| doc.body.get("items").is_some()));
}

#[tokio::test]
async fn test_nothing_is_lost_across_the_rewrite() {
	let store = MemoryStore::with_ttl_enabled(false);
	seed_legacy_orders(&store);
	// No catalog: order-refs drops every line but must preserve the payload

	let runner = BackfillRunner::new(Arc::new(store.clone()));
	runner.run(&CartItemsJob, &BackfillOptions::default()).await;
	runner.run(&OrderRefsJob, &BackfillOptions::default()).await;
	runner
		.run(&PaymentMetaJob, &BackfillOptions::default())
		.await;

	let raw = store
		.list_raw_orders(&commerce_ops::models::PageRequest::default())
		.await
		.unwrap();
	for doc in &raw.items {
		let legacy = doc.body.get("legacy_items");
		assert!(
			legacy.is_some_and(|v| !v.as_array().unwrap().is_empty()),
			"{} keeps its original cart under legacy_items",
			doc.id
		);
	}
}

#[tokio::test]
async fn test_drain_flush_endpoint_reports_per_target() {
	// Settings with one unreachable drain target
	let mut settings = mocks::test_settings();
	settings.drains.push(commerce_ops::config::DrainTarget {
		name: "dead-drain".to_string(),
		endpoint: "http://127.0.0.1:1/hook".to_string(),
		token: None,
	});

	let store = MemoryStore::with_ttl_enabled(false);
	let (router, _state) = commerce_ops::OpsBuilder::with_storage(store.clone())
		.with_settings(settings)
		.with_payment_gateway(Arc::new(commerce_ops::mocks::MockPaymentGateway::new()))
		.with_shipping_gateway(Arc::new(commerce_ops::mocks::MockShippingGateway::new()))
		.with_mailer(Arc::new(commerce_ops::mocks::MockMailer::new()))
		.start()
		.await
		.unwrap();

	// A request through the API records a function log
	let (status, _) = mocks::send_json(&router, "GET", "/api/v1/orders", None, &[]).await;
	assert_eq!(status, axum::http::StatusCode::OK);

	let (status, report) = mocks::send_json(
		&router,
		"POST",
		"/api/v1/drains/flush",
		Some(json!({"batchSize": 10})),
		&[],
	)
	.await;

	assert_eq!(status, axum::http::StatusCode::OK);
	assert_eq!(report["marked"], false);
	let outcomes = report["outcomes"].as_array().unwrap();
	assert_eq!(outcomes.len(), 1);
	assert_eq!(outcomes[0]["target"], "dead-drain");
	assert!(outcomes[0]["error"].is_string());
}

#[tokio::test]
async fn test_backfill_through_spawned_app_storage() {
	// The same storage the API serves is what the backfill rewrites
	let app = spawn_app().await;
	app.store.seed_raw(
		&DocId::new("order.legacy1"),
		json!({
			"id": "order.legacy1",
			"order_number": "SO-OLD",
			"status": "pending",
			"currency": "usd",
			"created_at": "2021-03-01T10:00:00Z",
			"updated_at": "2021-03-01T10:00:00Z",
			"items": [{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}]
		}),
	);

	let runner = BackfillRunner::new(Arc::new(app.store.clone()));
	let report = runner
		.run(&CartItemsJob, &BackfillOptions::default())
		.await;
	assert_eq!(report.patched, 1);

	// The rewritten order is now readable through the API
	let (status, body) = mocks::send_json(
		&app.router,
		"GET",
		"/api/v1/orders/order.legacy1",
		None,
		&[],
	)
	.await;
	assert_eq!(status, axum::http::StatusCode::OK);
	assert_eq!(body["lineItems"].as_array().unwrap().len(), 1);
}
