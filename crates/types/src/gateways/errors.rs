//! Error types for vendor gateway operations

use thiserror::Error;

/// Errors surfaced by payment, shipping, and mail gateways
#[derive(Error, Debug)]
pub enum GatewayError {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("{vendor} returned {status}: {message}")]
	Api {
		vendor: String,
		status: u16,
		message: String,
	},

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Gateway is disabled: {vendor}")]
	Disabled { vendor: String },

	#[error("Configuration error: {reason}")]
	Config { reason: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl GatewayError {
	/// Extract the upstream HTTP status, when one exists
	pub fn status_code(&self) -> Option<u16> {
		match self {
			GatewayError::Api { status, .. } => Some(*status),
			GatewayError::Http(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	/// Build an `Api` error from a vendor response
	pub fn api_failure(vendor: &str, status: u16, message: impl Into<String>) -> Self {
		Self::Api {
			vendor: vendor.to_string(),
			status,
			message: message.into(),
		}
	}
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_code_extraction() {
		let err = GatewayError::api_failure("stripe", 402, "card declined");
		assert_eq!(err.status_code(), Some(402));
		assert!(err.to_string().contains("stripe"));
		assert!(err.to_string().contains("402"));

		let err = GatewayError::Timeout { timeout_ms: 5000 };
		assert_eq!(err.status_code(), None);
	}
}
