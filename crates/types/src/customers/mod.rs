//! Customer document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DocId;

/// Customer document in the content store
///
/// Customers are keyed by email within the application; the identity webhook
/// attaches the provider subject when the shopper signs up for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	pub email: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Identity-provider subject (`sub` claim), set by the identity webhook
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subject: Option<String>,
	/// Payment-vendor customer id, set on first checkout
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_customer_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Customer {
	pub fn new(email: String) -> Self {
		let now = Utc::now();
		Self {
			id: DocId::random_with_prefix("customer"),
			rev: None,
			email,
			name: None,
			subject: None,
			payment_customer_id: None,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn with_name(mut self, name: String) -> Self {
		self.name = Some(name);
		self
	}

	pub fn with_subject(mut self, subject: String) -> Self {
		self.subject = Some(subject);
		self
	}
}
