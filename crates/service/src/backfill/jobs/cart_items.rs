//! Legacy cart-item remap job

use async_trait::async_trait;
use ops_storage::DocumentStore;
use ops_types::orders::{
	canonicalize_line_items, CanonicalizeOutcome, LegacyCartShape, CANONICAL_ITEMS_FIELD,
};
use ops_types::storage::{Patch, RawDocument, StorageError, StorageResult};
use ops_types::LineItem;
use serde_json::{json, Value};
use tracing::debug;

use crate::backfill::BackfillJob;

/// Rewrites historical cart fields (`items`, `cart_items`, `cartItems`,
/// `lineItems`) into canonical `line_items`, merging duplicate skus. The
/// original array is preserved under `legacy_items` so nothing is lost.
pub struct CartItemsJob;

/// Field names each legacy shape may occupy on the document
fn legacy_fields(shape: LegacyCartShape) -> &'static [&'static str] {
	match shape {
		LegacyCartShape::Items => &["items"],
		LegacyCartShape::CartItems => &["cart_items", "cartItems"],
		LegacyCartShape::CamelLineItems => &["lineItems"],
	}
}

#[async_trait]
impl BackfillJob for CartItemsJob {
	fn name(&self) -> &'static str {
		"cart-items"
	}

	fn description(&self) -> &'static str {
		"remap legacy cart item fields into canonical line_items"
	}

	async fn plan(
		&self,
		_storage: &dyn DocumentStore,
		doc: &RawDocument,
	) -> StorageResult<Option<Patch>> {
		let (items, source, dropped) = match canonicalize_line_items(&doc.body) {
			CanonicalizeOutcome::AlreadyCanonical | CanonicalizeOutcome::NoCart => {
				return Ok(None)
			},
			CanonicalizeOutcome::Rewritten {
				items,
				source,
				dropped,
			} => (items, source, dropped),
		};

		if dropped > 0 {
			debug!(
				"{}: dropping {} unanchored item(s) (original kept in legacy_items)",
				doc.id, dropped
			);
		}

		let total: i64 = items.iter().map(LineItem::subtotal).sum();
		let items_value =
			serde_json::to_value(&items).map_err(|e| StorageError::Serialization {
				message: e.to_string(),
			})?;

		let mut patch = Patch::new(doc.id.clone())
			.set(CANONICAL_ITEMS_FIELD, items_value)
			.set("total", json!(total));

		// Preserve the original array before unsetting its field
		for field in legacy_fields(source) {
			if let Some(original) = doc.body.get(*field) {
				if original.is_array() {
					patch = patch.set_if_missing("legacy_items", original.clone());
				}
				patch = patch.unset(*field);
			}
		}

		Ok(Some(patch))
	}
}

/// Shared by the jobs: parse the canonical line items off a raw document
pub(crate) fn canonical_items(body: &Value) -> Option<Vec<LineItem>> {
	let raw = body.get(CANONICAL_ITEMS_FIELD)?.as_array()?;
	serde_json::from_value(Value::Array(raw.clone())).ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use ops_storage::MemoryStore;
	use ops_types::DocId;

	#[tokio::test]
	async fn test_plan_rewrites_and_preserves_legacy() {
		let store = MemoryStore::new();
		let doc = RawDocument {
			id: DocId::new("order.0001"),
			body: json!({
				"id": "order.0001",
				"cartItems": [
					{"sku": "MUG-01", "title": "Mug", "quantity": 2, "unit_price": 1250},
					{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}
				]
			}),
		};

		let patch = CartItemsJob.plan(&store, &doc).await.unwrap().unwrap();
		assert_eq!(patch.set["total"], json!(3750));
		assert_eq!(patch.set["line_items"].as_array().unwrap().len(), 1);
		assert!(patch.set_if_missing.contains_key("legacy_items"));
		assert!(patch.unset.contains(&"cartItems".to_string()));
	}

	#[tokio::test]
	async fn test_plan_skips_canonical_documents() {
		let store = MemoryStore::new();
		let doc = RawDocument {
			id: DocId::new("order.0002"),
			body: json!({
				"id": "order.0002",
				"line_items": [{"sku": "TEE-01", "title": "Tee", "quantity": 1, "unit_price": 2000}]
			}),
		};

		assert!(CartItemsJob.plan(&store, &doc).await.unwrap().is_none());
	}
}
