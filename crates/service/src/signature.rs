//! Webhook signature verification using HMAC-SHA256
//!
//! Two conventions are in play at this boundary:
//!
//! - The payment vendor signs `"{timestamp}.{body}"` and sends
//!   `t=<unix>,v1=<hex>` in its signature header; verification enforces a
//!   tolerance window against replays.
//! - The identity provider sends a plain hex HMAC of the raw body in a
//!   single header.
//!
//! Verification always runs against the raw request body, before any JSON
//! parse, and comparisons are constant-time.

use chrono::Utc;
use hmac::{Hmac, Mac};
use ops_types::SecretString;
use sha2::Sha256;
use std::fmt::Write;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default replay tolerance for timestamped signatures
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Errors that can occur during signature verification
#[derive(Debug, Error)]
pub enum SignatureError {
	#[error("Signature header is missing")]
	Missing,

	#[error("Signature header is malformed: {reason}")]
	Malformed { reason: String },

	#[error("Signature timestamp outside tolerance ({tolerance_secs}s)")]
	Expired { tolerance_secs: i64 },

	#[error("Signature verification failed")]
	Mismatch,

	#[error("Failed to create HMAC: {0}")]
	HmacCreation(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait SignatureTrait: Send + Sync {
	/// Verify a `t=<unix>,v1=<hex>` timestamped signature over the raw body
	fn verify_timestamped(&self, header: &str, body: &[u8]) -> Result<(), SignatureError>;

	/// Verify a plain hex HMAC of the raw body
	fn verify_plain(&self, header: &str, body: &[u8]) -> Result<(), SignatureError>;

	/// Sign a payload, returning the hex digest (outbound drain deliveries)
	fn sign(&self, payload: &[u8]) -> Result<String, SignatureError>;
}

/// HMAC-SHA256 signature service over one shared secret
pub struct SignatureService {
	secret: SecretString,
	tolerance_secs: i64,
}

impl SignatureService {
	pub fn new(secret: SecretString) -> Self {
		Self {
			secret,
			tolerance_secs: DEFAULT_TOLERANCE_SECS,
		}
	}

	pub fn with_tolerance(secret: SecretString, tolerance_secs: i64) -> Self {
		Self {
			secret,
			tolerance_secs,
		}
	}

	fn mac(&self) -> Result<HmacSha256, SignatureError> {
		HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
			.map_err(|e| SignatureError::HmacCreation(e.to_string()))
	}

	fn hex_digest(&self, payload: &[u8]) -> Result<String, SignatureError> {
		let mut mac = self.mac()?;
		mac.update(payload);
		let bytes = mac.finalize().into_bytes();

		let mut hex_string = String::with_capacity(bytes.len() * 2);
		for byte in bytes {
			write!(&mut hex_string, "{:02x}", byte)
				.map_err(|e| SignatureError::HmacCreation(e.to_string()))?;
		}
		Ok(hex_string)
	}

	/// Constant-time check of an expected hex digest against a payload
	fn verify_digest(&self, payload: &[u8], expected_hex: &str) -> Result<(), SignatureError> {
		let expected = hex::decode(expected_hex).map_err(|_| SignatureError::Malformed {
			reason: "signature is not valid hex".to_string(),
		})?;
		let mut mac = self.mac()?;
		mac.update(payload);
		mac.verify_slice(&expected)
			.map_err(|_| SignatureError::Mismatch)
	}
}

impl SignatureTrait for SignatureService {
	fn verify_timestamped(&self, header: &str, body: &[u8]) -> Result<(), SignatureError> {
		let mut timestamp: Option<i64> = None;
		let mut candidates: Vec<&str> = Vec::new();

		for part in header.split(',') {
			match part.trim().split_once('=') {
				Some(("t", value)) => {
					timestamp = value.parse().ok();
				},
				Some(("v1", value)) => candidates.push(value),
				_ => {},
			}
		}

		let timestamp = timestamp.ok_or_else(|| SignatureError::Malformed {
			reason: "missing t= element".to_string(),
		})?;
		if candidates.is_empty() {
			return Err(SignatureError::Malformed {
				reason: "missing v1= element".to_string(),
			});
		}

		let age = (Utc::now().timestamp() - timestamp).abs();
		if age > self.tolerance_secs {
			return Err(SignatureError::Expired {
				tolerance_secs: self.tolerance_secs,
			});
		}

		// Vendors may include several v1 entries during secret rotation;
		// any valid one passes.
		let mut signed_payload = Vec::with_capacity(body.len() + 16);
		signed_payload.extend_from_slice(timestamp.to_string().as_bytes());
		signed_payload.push(b'.');
		signed_payload.extend_from_slice(body);

		for candidate in candidates {
			if self.verify_digest(&signed_payload, candidate).is_ok() {
				return Ok(());
			}
		}
		Err(SignatureError::Mismatch)
	}

	fn verify_plain(&self, header: &str, body: &[u8]) -> Result<(), SignatureError> {
		if header.trim().is_empty() {
			return Err(SignatureError::Missing);
		}
		self.verify_digest(body, header.trim())
	}

	fn sign(&self, payload: &[u8]) -> Result<String, SignatureError> {
		self.hex_digest(payload)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn service() -> SignatureService {
		SignatureService::new(SecretString::from_str("whsec_test_secret"))
	}

	fn timestamped_header(svc: &SignatureService, body: &[u8], timestamp: i64) -> String {
		let payload = format!(
			"{}.{}",
			timestamp,
			std::str::from_utf8(body).unwrap_or_default()
		);
		let digest = svc.hex_digest(payload.as_bytes()).unwrap();
		format!("t={},v1={}", timestamp, digest)
	}

	#[test]
	fn test_timestamped_signature_round_trip() {
		let svc = service();
		let body = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
		let header = timestamped_header(&svc, body, Utc::now().timestamp());

		assert!(svc.verify_timestamped(&header, body).is_ok());
	}

	#[test]
	fn test_tampered_body_is_rejected() {
		let svc = service();
		let body = br#"{"amount":4500}"#;
		let header = timestamped_header(&svc, body, Utc::now().timestamp());

		let tampered = br#"{"amount":1}"#;
		assert!(matches!(
			svc.verify_timestamped(&header, tampered),
			Err(SignatureError::Mismatch)
		));
	}

	#[test]
	fn test_stale_timestamp_is_rejected() {
		let svc = service();
		let body = b"{}";
		let stale = Utc::now().timestamp() - DEFAULT_TOLERANCE_SECS - 60;
		let header = timestamped_header(&svc, body, stale);

		assert!(matches!(
			svc.verify_timestamped(&header, body),
			Err(SignatureError::Expired { .. })
		));
	}

	#[test]
	fn test_malformed_header() {
		let svc = service();
		assert!(matches!(
			svc.verify_timestamped("v1=abcd", b"{}"),
			Err(SignatureError::Malformed { .. })
		));
		assert!(matches!(
			svc.verify_timestamped("t=123", b"{}"),
			Err(SignatureError::Malformed { .. })
		));
	}

	#[test]
	fn test_rotation_accepts_any_valid_v1() {
		let svc = service();
		let body = b"{}";
		let now = Utc::now().timestamp();
		let valid = timestamped_header(&svc, body, now);
		let digest = valid.split("v1=").nth(1).unwrap();
		let header = format!("t={},v1={},v1={}", now, "00".repeat(32), digest);

		assert!(svc.verify_timestamped(&header, body).is_ok());
	}

	#[test]
	fn test_plain_signature_round_trip() {
		let svc = service();
		let body = br#"{"user_id":"auth0|abc"}"#;
		let digest = svc.sign(body).unwrap();

		assert!(svc.verify_plain(&digest, body).is_ok());
		assert!(matches!(
			svc.verify_plain(&digest, b"other"),
			Err(SignatureError::Mismatch)
		));
		assert!(matches!(
			svc.verify_plain("", body),
			Err(SignatureError::Missing)
		));
	}

	#[test]
	fn test_non_hex_signature_is_malformed() {
		let svc = service();
		assert!(matches!(
			svc.verify_plain("not-hex!", b"{}"),
			Err(SignatureError::Malformed { .. })
		));
	}
}
