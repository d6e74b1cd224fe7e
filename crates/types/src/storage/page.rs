//! Cursor pagination types
//!
//! Listings are id-ordered. A cursor is the last document id of the previous
//! page, passed back verbatim; backends treat it as opaque.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not specify one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Hard cap on page size
pub const MAX_PAGE_SIZE: usize = 200;

/// Request for one page of results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRequest {
	/// Resume after this document id; None starts from the beginning
	pub after: Option<String>,
	/// Desired page size; clamped to [1, MAX_PAGE_SIZE]
	pub limit: Option<usize>,
}

impl PageRequest {
	pub fn first(limit: usize) -> Self {
		Self {
			after: None,
			limit: Some(limit),
		}
	}

	pub fn after(cursor: impl Into<String>, limit: usize) -> Self {
		Self {
			after: Some(cursor.into()),
			limit: Some(limit),
		}
	}

	/// Effective page size after clamping
	pub fn effective_limit(&self) -> usize {
		self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
	}
}

/// One page of results with the cursor for the next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// Absent on the last page
	pub next_cursor: Option<String>,
}

impl<T> Page<T> {
	pub fn empty() -> Self {
		Self {
			items: Vec::new(),
			next_cursor: None,
		}
	}

	pub fn is_last(&self) -> bool {
		self.next_cursor.is_none()
	}

	pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
		Page {
			items: self.items.into_iter().map(f).collect(),
			next_cursor: self.next_cursor,
		}
	}
}
