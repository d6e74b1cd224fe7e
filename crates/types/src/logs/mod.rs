//! Function invocation logs and drain delivery types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::models::DocId;

/// Severity of a logged invocation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Info,
	Warn,
	Error,
}

/// One function invocation recorded in the content store
///
/// The old platform wrote these per serverless invocation; here one is
/// written per handled request, and drains deliver them in batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionLog {
	pub id: DocId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev: Option<String>,
	/// Handler name, e.g. `checkout` or `webhooks.payments`
	pub function: String,
	pub level: LogLevel,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	pub status: u16,
	pub duration_ms: u64,
	/// Set once a drain run has delivered this entry everywhere
	#[serde(default)]
	pub drained: bool,
	pub recorded_at: DateTime<Utc>,
}

impl FunctionLog {
	pub fn new(function: String, status: u16, duration_ms: u64) -> Self {
		let level = if status >= 500 {
			LogLevel::Error
		} else if status >= 400 {
			LogLevel::Warn
		} else {
			LogLevel::Info
		};
		Self {
			id: DocId::random_with_prefix("log"),
			rev: None,
			function,
			level,
			message: String::new(),
			request_id: None,
			status,
			duration_ms,
			drained: false,
			recorded_at: Utc::now(),
		}
	}

	pub fn with_message(mut self, message: String) -> Self {
		self.message = message;
		self
	}

	pub fn with_request_id(mut self, request_id: String) -> Self {
		self.request_id = Some(request_id);
		self
	}
}

/// Outcome of delivering one batch to one drain target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DrainOutcome {
	pub target: String,
	pub delivered: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl DrainOutcome {
	pub fn ok(target: String, delivered: usize) -> Self {
		Self {
			target,
			delivered,
			error: None,
		}
	}

	pub fn failed(target: String, error: String) -> Self {
		Self {
			target,
			delivered: 0,
			error: Some(error),
		}
	}

	pub fn is_ok(&self) -> bool {
		self.error.is_none()
	}
}
