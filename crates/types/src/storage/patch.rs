//! Patch and transaction model for document mutations
//!
//! Mirrors the content store's mutation API: a patch sets, conditionally
//! sets, or unsets fields on one document; a transaction is an ordered batch
//! of mutations the store applies atomically. Backends translate this model
//! to their own wire format (or apply it directly, for the memory store).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::DocId;

/// Field-level changes against one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
	pub id: DocId,
	/// Fields to overwrite
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub set: Map<String, Value>,
	/// Fields to write only when currently absent
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub set_if_missing: Map<String, Value>,
	/// Fields to remove
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub unset: Vec<String>,
	/// When set, the store must reject the patch if the document revision
	/// has moved on (optimistic concurrency)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub if_revision: Option<String>,
}

impl Patch {
	pub fn new(id: DocId) -> Self {
		Self {
			id,
			set: Map::new(),
			set_if_missing: Map::new(),
			unset: Vec::new(),
			if_revision: None,
		}
	}

	pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
		self.set.insert(field.into(), value);
		self
	}

	pub fn set_if_missing(mut self, field: impl Into<String>, value: Value) -> Self {
		self.set_if_missing.insert(field.into(), value);
		self
	}

	pub fn unset(mut self, field: impl Into<String>) -> Self {
		self.unset.push(field.into());
		self
	}

	pub fn if_revision(mut self, rev: impl Into<String>) -> Self {
		self.if_revision = Some(rev.into());
		self
	}

	/// A patch with nothing to do should not be sent to the store
	pub fn is_empty(&self) -> bool {
		self.set.is_empty() && self.set_if_missing.is_empty() && self.unset.is_empty()
	}

	/// Apply this patch to a raw document value, in the store's order:
	/// set, then set-if-missing, then unset.
	pub fn apply_to(&self, doc: &mut Value) {
		let Some(obj) = doc.as_object_mut() else {
			return;
		};
		for (field, value) in &self.set {
			obj.insert(field.clone(), value.clone());
		}
		for (field, value) in &self.set_if_missing {
			obj.entry(field.clone()).or_insert_with(|| value.clone());
		}
		for field in &self.unset {
			obj.remove(field);
		}
	}
}

/// One mutation within a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
	/// Create the document unless one with its id already exists
	CreateIfMissing(Value),
	Patch(Patch),
	Delete(DocId),
}

/// An ordered batch of mutations applied atomically by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
	pub mutations: Vec<Mutation>,
}

impl Transaction {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create_if_missing(mut self, doc: Value) -> Self {
		self.mutations.push(Mutation::CreateIfMissing(doc));
		self
	}

	pub fn patch(mut self, patch: Patch) -> Self {
		if !patch.is_empty() {
			self.mutations.push(Mutation::Patch(patch));
		}
		self
	}

	pub fn delete(mut self, id: DocId) -> Self {
		self.mutations.push(Mutation::Delete(id));
		self
	}

	pub fn is_empty(&self) -> bool {
		self.mutations.is_empty()
	}

	pub fn len(&self) -> usize {
		self.mutations.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_patch_apply_order() {
		let patch = Patch::new(DocId::new("order.1"))
			.set("status", json!("paid"))
			.set_if_missing("email_sent", json!(false))
			.set_if_missing("status", json!("pending"))
			.unset("legacy_items");

		let mut doc = json!({
			"id": "order.1",
			"status": "awaiting_payment",
			"legacy_items": [1, 2]
		});
		patch.apply_to(&mut doc);

		// set wins over set_if_missing for the same field
		assert_eq!(doc["status"], json!("paid"));
		assert_eq!(doc["email_sent"], json!(false));
		assert!(doc.get("legacy_items").is_none());
	}

	#[test]
	fn test_empty_patch_detection() {
		let patch = Patch::new(DocId::new("order.1"));
		assert!(patch.is_empty());
		assert!(Transaction::new().patch(patch).is_empty());
	}
}
