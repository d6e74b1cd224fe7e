//! Product document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DocId;

/// Product document in the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	pub sku: String,
	pub title: String,
	/// Price in minor currency units
	pub price: i64,
	pub currency: String,
	/// Inactive products cannot be checked out
	#[serde(default = "default_active")]
	pub active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
	true
}

impl Product {
	pub fn new(sku: String, title: String, price: i64, currency: String) -> Self {
		let now = Utc::now();
		Self {
			id: DocId::random_with_prefix("product"),
			rev: None,
			sku,
			title,
			price,
			currency,
			active: true,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn deactivated(mut self) -> Self {
		self.active = false;
		self
	}
}
