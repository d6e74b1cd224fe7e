//! Broken product reference repair job

use async_trait::async_trait;
use ops_storage::traits::{DocumentStore, ProductStorage};
use ops_types::orders::CANONICAL_ITEMS_FIELD;
use ops_types::storage::{Patch, RawDocument, StorageError, StorageResult};
use ops_types::LineItem;
use serde_json::json;
use tracing::debug;

use super::cart_items::canonical_items;
use crate::backfill::BackfillJob;

/// Repairs product references on canonical line items. A reference is broken
/// when it is absent or points at a document that no longer exists; repair
/// resolves the item's sku against the catalog. Items whose sku is also gone
/// are removed, with the pre-repair array preserved under `legacy_items`.
///
/// Runs after [`super::CartItemsJob`], which produces the canonical array
/// this job walks.
pub struct OrderRefsJob;

#[async_trait]
impl BackfillJob for OrderRefsJob {
	fn name(&self) -> &'static str {
		"order-refs"
	}

	fn description(&self) -> &'static str {
		"repair broken product references on line items"
	}

	async fn plan(
		&self,
		storage: &dyn DocumentStore,
		doc: &RawDocument,
	) -> StorageResult<Option<Patch>> {
		let Some(items) = canonical_items(&doc.body) else {
			return Ok(None);
		};

		let mut repaired: Vec<LineItem> = Vec::with_capacity(items.len());
		let mut changed = false;
		let mut dropped = 0usize;

		for mut item in items {
			// A present reference that resolves is already fine
			if let Some(reference) = &item.product {
				if storage.get_product(reference).await?.is_some() {
					repaired.push(item);
					continue;
				}
			}

			match storage.get_product_by_sku(&item.sku).await? {
				Some(product) => {
					debug!(
						"{}: re-pointing sku {} at {}",
						doc.id, item.sku, product.id
					);
					item.product = Some(product.id);
					repaired.push(item);
					changed = true;
				},
				None => {
					debug!("{}: dropping line for vanished sku {}", doc.id, item.sku);
					dropped += 1;
					changed = true;
				},
			}
		}

		if !changed {
			return Ok(None);
		}

		let total: i64 = repaired.iter().map(LineItem::subtotal).sum();
		let items_value =
			serde_json::to_value(&repaired).map_err(|e| StorageError::Serialization {
				message: e.to_string(),
			})?;

		let mut patch = Patch::new(doc.id.clone())
			.set(CANONICAL_ITEMS_FIELD, items_value)
			.set("total", json!(total));

		if dropped > 0 {
			// Keep what we removed; data loss is the one thing a backfill
			// must never cause.
			if let Some(original) = doc.body.get(CANONICAL_ITEMS_FIELD) {
				patch = patch.set_if_missing("legacy_items", original.clone());
			}
		}

		Ok(Some(patch))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ops_storage::MemoryStore;
	use ops_types::{DocId, Product};

	async fn store_with_mug() -> (MemoryStore, Product) {
		let store = MemoryStore::new();
		let product = Product::new(
			"MUG-01".to_string(),
			"Mug".to_string(),
			1250,
			"usd".to_string(),
		);
		store.create_product(product.clone()).await.unwrap();
		(store, product)
	}

	#[tokio::test]
	async fn test_missing_ref_is_resolved_by_sku() {
		let (store, product) = store_with_mug().await;
		let doc = RawDocument {
			id: DocId::new("order.0001"),
			body: json!({
				"id": "order.0001",
				"line_items": [
					{"sku": "MUG-01", "title": "Mug", "quantity": 2, "unit_price": 1250}
				]
			}),
		};

		let patch = OrderRefsJob.plan(&store, &doc).await.unwrap().unwrap();
		let items = patch.set[CANONICAL_ITEMS_FIELD].as_array().unwrap();
		assert_eq!(items[0]["product"], json!(product.id.as_str()));
	}

	#[tokio::test]
	async fn test_dangling_ref_with_live_sku_is_repointed() {
		let (store, product) = store_with_mug().await;
		let doc = RawDocument {
			id: DocId::new("order.0002"),
			body: json!({
				"id": "order.0002",
				"line_items": [
					{"product": "product.deleted", "sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}
				]
			}),
		};

		let patch = OrderRefsJob.plan(&store, &doc).await.unwrap().unwrap();
		let items = patch.set[CANONICAL_ITEMS_FIELD].as_array().unwrap();
		assert_eq!(items[0]["product"], json!(product.id.as_str()));
	}

	#[tokio::test]
	async fn test_vanished_sku_is_dropped_but_preserved() {
		let (store, _) = store_with_mug().await;
		let doc = RawDocument {
			id: DocId::new("order.0003"),
			body: json!({
				"id": "order.0003",
				"line_items": [
					{"sku": "GONE-99", "title": "Ghost", "quantity": 1, "unit_price": 500},
					{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}
				]
			}),
		};

		let patch = OrderRefsJob.plan(&store, &doc).await.unwrap().unwrap();
		let items = patch.set[CANONICAL_ITEMS_FIELD].as_array().unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0]["sku"], "MUG-01");
		assert_eq!(patch.set["total"], json!(1250));
		// Original two-line array preserved
		assert_eq!(
			patch.set_if_missing["legacy_items"].as_array().unwrap().len(),
			2
		);
	}

	#[tokio::test]
	async fn test_intact_document_plans_nothing() {
		let (store, product) = store_with_mug().await;
		let doc = RawDocument {
			id: DocId::new("order.0004"),
			body: json!({
				"id": "order.0004",
				"line_items": [
					{"product": product.id.as_str(), "sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}
				]
			}),
		};

		assert!(OrderRefsJob.plan(&store, &doc).await.unwrap().is_none());
	}
}
