//! Canonicalization of historical order payloads
//!
//! Orders written by earlier revisions of the storefront carry their cart
//! under a handful of field names (`items`, `cartItems`, `lineItems`, ...)
//! with per-item fields that drifted over time. The functions here map any of
//! those shapes onto the canonical `line_items` array without losing data:
//! duplicate skus are merged with quantities summed, and only items with
//! neither a sku nor a product reference are dropped (they are unrecoverable).
//!
//! Everything in this module is pure; the backfill runner in the service
//! crate decides what to write back.

use serde_json::Value;

use super::LineItem;
use crate::models::DocId;

/// Canonical field name for cart contents
pub const CANONICAL_ITEMS_FIELD: &str = "line_items";

/// Legacy field names a cart was stored under, oldest first
const LEGACY_ITEM_FIELDS: &[(&str, LegacyCartShape)] = &[
	("items", LegacyCartShape::Items),
	("cart_items", LegacyCartShape::CartItems),
	("cartItems", LegacyCartShape::CartItems),
	("lineItems", LegacyCartShape::CamelLineItems),
];

/// Which historical shape a document's cart was found under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCartShape {
	/// `items: [...]` from the first storefront revision
	Items,
	/// `cart_items` / `cartItems` from the interim cart service
	CartItems,
	/// `lineItems` (camelCase) written by the old CMS studio
	CamelLineItems,
}

/// Result of inspecting one raw order document
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalizeOutcome {
	/// Document already carries canonical `line_items`; nothing to do
	AlreadyCanonical,
	/// Document has no cart in any known shape
	NoCart,
	/// Cart found under a legacy field and rewritten
	Rewritten {
		items: Vec<LineItem>,
		source: LegacyCartShape,
		/// Items with neither sku nor product reference, silently unrecoverable
		dropped: usize,
	},
}

/// Inspect a raw order document and, if its cart lives under a legacy field,
/// produce the canonical line items.
pub fn canonicalize_line_items(doc: &Value) -> CanonicalizeOutcome {
	let obj = match doc.as_object() {
		Some(obj) => obj,
		None => return CanonicalizeOutcome::NoCart,
	};

	// A populated canonical field wins over any legacy leftovers; the refs
	// job cleans those up separately.
	if obj
		.get(CANONICAL_ITEMS_FIELD)
		.and_then(Value::as_array)
		.is_some_and(|a| !a.is_empty())
	{
		return CanonicalizeOutcome::AlreadyCanonical;
	}

	for (field, shape) in LEGACY_ITEM_FIELDS {
		if let Some(raw_items) = obj.get(*field).and_then(Value::as_array) {
			let (items, dropped) = remap_items(raw_items);
			return CanonicalizeOutcome::Rewritten {
				items,
				source: *shape,
				dropped,
			};
		}
	}

	CanonicalizeOutcome::NoCart
}

/// Remap raw legacy items, merging duplicates by sku
fn remap_items(raw_items: &[Value]) -> (Vec<LineItem>, usize) {
	let mut items: Vec<LineItem> = Vec::new();
	let mut dropped = 0usize;

	for raw in raw_items {
		let Some(item) = remap_item(raw) else {
			dropped += 1;
			continue;
		};

		match items.iter_mut().find(|existing| existing.sku == item.sku) {
			Some(existing) => {
				existing.quantity += item.quantity;
				// First-seen title/price/ref win; later duplicates only
				// contribute quantity.
				if existing.product.is_none() {
					existing.product = item.product;
				}
			},
			None => items.push(item),
		}
	}

	(items, dropped)
}

/// Remap a single raw item, tolerating every historical field alias
fn remap_item(raw: &Value) -> Option<LineItem> {
	let obj = raw.as_object()?;

	let product = product_ref(obj);
	let sku = first_str(obj, &["sku", "productSku", "sku_code", "skuCode"]);

	// With neither a sku nor a product reference there is nothing to anchor
	// the item to; it cannot be repaired later either.
	let sku = match (sku, &product) {
		(Some(sku), _) => sku.to_string(),
		(None, Some(doc_id)) => doc_id.as_str().to_string(),
		(None, None) => return None,
	};

	let title = first_str(obj, &["title", "name", "productTitle", "product_title"])
		.unwrap_or(&sku)
		.to_string();

	let quantity = first_u64(obj, &["quantity", "qty", "count"]).unwrap_or(1) as u32;

	let unit_price = price_minor_units(obj);

	Some(LineItem {
		product,
		sku,
		title,
		quantity,
		unit_price,
	})
}

/// Pull a product reference out of any of its historical encodings:
/// `product: {_ref: "..."}`, `productRef: "..."`, or `product: "..."`.
fn product_ref(obj: &serde_json::Map<String, Value>) -> Option<DocId> {
	if let Some(product) = obj.get("product") {
		if let Some(reference) = product.get("_ref").and_then(Value::as_str) {
			return Some(DocId::new(reference));
		}
		if let Some(id) = product.as_str() {
			return Some(DocId::new(id));
		}
	}
	obj.get("productRef")
		.or_else(|| obj.get("product_ref"))
		.and_then(Value::as_str)
		.map(DocId::new)
}

/// Unit price in minor units. Integer values are already minor units; float
/// values come from the era when prices were stored in major units.
fn price_minor_units(obj: &serde_json::Map<String, Value>) -> i64 {
	for field in ["unit_price", "unitPrice", "price"] {
		if let Some(value) = obj.get(field) {
			if let Some(minor) = value.as_i64() {
				return minor;
			}
			if let Some(major) = value.as_f64() {
				return (major * 100.0).round() as i64;
			}
		}
	}
	0
}

fn first_str<'a>(obj: &'a serde_json::Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
	fields.iter().find_map(|f| obj.get(*f).and_then(Value::as_str))
}

fn first_u64(obj: &serde_json::Map<String, Value>, fields: &[&str]) -> Option<u64> {
	fields.iter().find_map(|f| obj.get(*f).and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_already_canonical_document_is_untouched() {
		let doc = json!({
			"id": "order.1",
			"line_items": [{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}]
		});
		assert_eq!(
			canonicalize_line_items(&doc),
			CanonicalizeOutcome::AlreadyCanonical
		);
	}

	#[test]
	fn test_document_without_cart() {
		let doc = json!({"id": "order.2", "status": "pending"});
		assert_eq!(canonicalize_line_items(&doc), CanonicalizeOutcome::NoCart);
	}

	#[test]
	fn test_remaps_oldest_items_shape() {
		let doc = json!({
			"id": "order.3",
			"items": [
				{"sku": "MUG-01", "name": "Mug", "qty": 2, "price": 12.5},
				{"productRef": "product.tee", "sku": "TEE-01", "title": "Tee", "quantity": 1, "unitPrice": 2000}
			]
		});

		match canonicalize_line_items(&doc) {
			CanonicalizeOutcome::Rewritten {
				items,
				source,
				dropped,
			} => {
				assert_eq!(source, LegacyCartShape::Items);
				assert_eq!(dropped, 0);
				assert_eq!(items.len(), 2);

				assert_eq!(items[0].sku, "MUG-01");
				assert_eq!(items[0].title, "Mug");
				assert_eq!(items[0].quantity, 2);
				// 12.5 major units -> 1250 minor
				assert_eq!(items[0].unit_price, 1250);

				assert_eq!(items[1].product, Some(DocId::new("product.tee")));
				assert_eq!(items[1].unit_price, 2000);
			},
			other => panic!("expected rewrite, got {:?}", other),
		}
	}

	#[test]
	fn test_duplicate_skus_are_merged_with_quantities_summed() {
		let doc = json!({
			"cartItems": [
				{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250},
				{"sku": "MUG-01", "title": "Mug (dup)", "quantity": 3, "unit_price": 1250}
			]
		});

		match canonicalize_line_items(&doc) {
			CanonicalizeOutcome::Rewritten { items, .. } => {
				assert_eq!(items.len(), 1);
				assert_eq!(items[0].quantity, 4);
				// First-seen title wins
				assert_eq!(items[0].title, "Mug");
			},
			other => panic!("expected rewrite, got {:?}", other),
		}
	}

	#[test]
	fn test_unanchored_items_are_dropped_and_counted() {
		let doc = json!({
			"lineItems": [
				{"title": "Mystery", "quantity": 1},
				{"sku": "TEE-01", "title": "Tee", "quantity": 1, "unit_price": 2000}
			]
		});

		match canonicalize_line_items(&doc) {
			CanonicalizeOutcome::Rewritten { items, dropped, .. } => {
				assert_eq!(items.len(), 1);
				assert_eq!(dropped, 1);
			},
			other => panic!("expected rewrite, got {:?}", other),
		}
	}

	#[test]
	fn test_item_anchored_only_by_product_ref() {
		let doc = json!({
			"items": [
				{"product": {"_ref": "product.poster"}, "quantity": 2, "price": 9.99}
			]
		});

		match canonicalize_line_items(&doc) {
			CanonicalizeOutcome::Rewritten { items, .. } => {
				assert_eq!(items[0].sku, "product.poster");
				assert_eq!(items[0].product, Some(DocId::new("product.poster")));
				assert_eq!(items[0].unit_price, 999);
			},
			other => panic!("expected rewrite, got {:?}", other),
		}
	}

	#[test]
	fn test_canonicalization_is_idempotent() {
		let doc = json!({
			"items": [{"sku": "MUG-01", "title": "Mug", "quantity": 1, "unit_price": 1250}]
		});

		let items = match canonicalize_line_items(&doc) {
			CanonicalizeOutcome::Rewritten { items, .. } => items,
			other => panic!("expected rewrite, got {:?}", other),
		};

		// Simulate the patched document: canonical field set, legacy unset
		let patched = json!({ "line_items": items });
		assert_eq!(
			canonicalize_line_items(&patched),
			CanonicalizeOutcome::AlreadyCanonical
		);
	}
}
