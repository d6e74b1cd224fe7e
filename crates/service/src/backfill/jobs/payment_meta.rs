//! Missing payment metadata backfill job

use async_trait::async_trait;
use ops_storage::DocumentStore;
use ops_types::storage::{Patch, RawDocument, StorageResult};
use serde_json::{json, Value};
use tracing::debug;

use crate::backfill::BackfillJob;

/// Legacy field names the old checkout left the intent id under
const LEGACY_INTENT_FIELDS: &[&str] = &[
	"paymentIntentId",
	"payment_intent_id",
	"stripePaymentIntentId",
];

/// Legacy field names for the charge id
const LEGACY_CHARGE_FIELDS: &[&str] = &["stripeChargeId", "chargeId", "charge_id"];

/// Seeds the canonical `payment` block on orders that only carry a loose
/// intent id field from the old checkout. Writes with set-if-missing only, so
/// an order that gained a real payment block since the scan is left alone.
pub struct PaymentMetaJob;

#[async_trait]
impl BackfillJob for PaymentMetaJob {
	fn name(&self) -> &'static str {
		"payment-meta"
	}

	fn description(&self) -> &'static str {
		"seed missing payment blocks from legacy intent id fields"
	}

	async fn plan(
		&self,
		_storage: &dyn DocumentStore,
		doc: &RawDocument,
	) -> StorageResult<Option<Patch>> {
		let obj = match doc.body.as_object() {
			Some(obj) => obj,
			None => return Ok(None),
		};

		// A populated payment block means nothing to do
		if obj.get("payment").is_some_and(Value::is_object) {
			return Ok(None);
		}

		let Some((intent_field, intent_id)) = LEGACY_INTENT_FIELDS
			.iter()
			.find_map(|f| obj.get(*f).and_then(Value::as_str).map(|v| (*f, v)))
		else {
			return Ok(None);
		};

		let amount = obj.get("total").and_then(Value::as_i64).unwrap_or(0);
		let currency = obj
			.get("currency")
			.and_then(Value::as_str)
			.unwrap_or("usd");

		let mut payment = json!({
			"intent_id": intent_id,
			"amount": amount,
			"currency": currency,
		});
		if let Some(charge_id) = LEGACY_CHARGE_FIELDS
			.iter()
			.find_map(|f| obj.get(*f).and_then(Value::as_str))
		{
			payment["charge_id"] = json!(charge_id);
		}

		debug!("{}: seeding payment block from {}", doc.id, intent_field);

		let mut patch = Patch::new(doc.id.clone()).set_if_missing("payment", payment);
		for field in LEGACY_INTENT_FIELDS.iter().chain(LEGACY_CHARGE_FIELDS) {
			if obj.contains_key(*field) {
				patch = patch.unset(*field);
			}
		}

		Ok(Some(patch))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ops_storage::MemoryStore;
	use ops_types::DocId;

	#[tokio::test]
	async fn test_seeds_payment_from_legacy_field() {
		let store = MemoryStore::new();
		let doc = RawDocument {
			id: DocId::new("order.0001"),
			body: json!({
				"id": "order.0001",
				"total": 4500,
				"currency": "usd",
				"paymentIntentId": "pi_legacy_1",
				"stripeChargeId": "ch_legacy_1"
			}),
		};

		let patch = PaymentMetaJob.plan(&store, &doc).await.unwrap().unwrap();
		let payment = &patch.set_if_missing["payment"];
		assert_eq!(payment["intent_id"], "pi_legacy_1");
		assert_eq!(payment["amount"], 4500);
		assert_eq!(payment["charge_id"], "ch_legacy_1");
		assert!(patch.unset.contains(&"paymentIntentId".to_string()));
		assert!(patch.unset.contains(&"stripeChargeId".to_string()));
	}

	#[tokio::test]
	async fn test_existing_payment_block_wins() {
		let store = MemoryStore::new();
		let doc = RawDocument {
			id: DocId::new("order.0002"),
			body: json!({
				"id": "order.0002",
				"payment": {"intent_id": "pi_real", "amount": 100, "currency": "usd"},
				"paymentIntentId": "pi_stale"
			}),
		};

		// The stale field survives here; a populated block means hands off
		assert!(PaymentMetaJob.plan(&store, &doc).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_document_without_legacy_fields_is_skipped() {
		let store = MemoryStore::new();
		let doc = RawDocument {
			id: DocId::new("order.0003"),
			body: json!({"id": "order.0003", "total": 100}),
		};

		assert!(PaymentMetaJob.plan(&store, &doc).await.unwrap().is_none());
	}
}
