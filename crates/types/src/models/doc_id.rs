//! Document identifiers and the draft/published convention
//!
//! The content store distinguishes draft and published variants of the same
//! document by an id prefix: `drafts.<id>` is the draft, `<id>` the published
//! copy. Everything else treats ids as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix marking the draft variant of a document
pub const DRAFT_PREFIX: &str = "drafts.";

/// Opaque document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema), schema(value_type = String))]
pub struct DocId(String);

impl DocId {
	/// Wrap an existing id string
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Generate a fresh random id
	pub fn random() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	/// Generate a fresh id under a type prefix, e.g. `order.<uuid>`
	pub fn random_with_prefix(prefix: &str) -> Self {
		Self(format!("{}.{}", prefix, Uuid::new_v4()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whether this id names the draft variant
	pub fn is_draft(&self) -> bool {
		self.0.starts_with(DRAFT_PREFIX)
	}

	/// The published id, stripping a draft prefix if present
	pub fn published(&self) -> DocId {
		match self.0.strip_prefix(DRAFT_PREFIX) {
			Some(rest) => DocId(rest.to_string()),
			None => self.clone(),
		}
	}

	/// The draft id for this document
	pub fn draft(&self) -> DocId {
		if self.is_draft() {
			self.clone()
		} else {
			DocId(format!("{}{}", DRAFT_PREFIX, self.0))
		}
	}
}

impl fmt::Display for DocId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for DocId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl From<&str> for DocId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_draft_round_trip() {
		let id = DocId::new("order.abc123");
		assert!(!id.is_draft());

		let draft = id.draft();
		assert!(draft.is_draft());
		assert_eq!(draft.as_str(), "drafts.order.abc123");
		assert_eq!(draft.published(), id);

		// Drafting a draft is a no-op
		assert_eq!(draft.draft(), draft);
	}

	#[test]
	fn test_published_on_published_id_is_identity() {
		let id = DocId::new("product.xyz");
		assert_eq!(id.published(), id);
	}

	#[test]
	fn test_random_with_prefix() {
		let id = DocId::random_with_prefix("order");
		assert!(id.as_str().starts_with("order."));
		assert!(!id.is_draft());
	}
}
