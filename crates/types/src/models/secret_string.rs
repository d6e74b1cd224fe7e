//! Secure string handling for vendor credentials
//!
//! `SecretString` holds API keys and webhook secrets and zeroizes the
//! underlying memory when dropped. Debug/Display never print the value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that clears its contents from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
	inner: String,
}

impl SecretString {
	pub fn new(secret: String) -> Self {
		Self { inner: secret }
	}

	pub fn from_str(secret: &str) -> Self {
		Self::new(secret.to_string())
	}

	/// Expose the secret value. Use sparingly, at the point the credential
	/// is actually written into a request.
	pub fn expose_secret(&self) -> &str {
		&self.inner
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString([REDACTED; {} bytes])", self.inner.len())
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[REDACTED]")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::from_str(s)
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		// Length check first keeps the comparison from short-circuiting on
		// unequal lengths revealing a prefix match.
		self.inner.len() == other.inner.len()
			&& self
				.inner
				.bytes()
				.zip(other.inner.bytes())
				.fold(0u8, |acc, (a, b)| acc | (a ^ b))
				== 0
	}
}

impl Serialize for SecretString {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str("[REDACTED]")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_debug_and_display_redact() {
		let secret = SecretString::from_str("sk_live_abc123");
		assert!(!format!("{:?}", secret).contains("sk_live"));
		assert_eq!(secret.to_string(), "[REDACTED]");
	}

	#[test]
	fn test_serialize_redacts() {
		let secret = SecretString::from_str("whsec_xyz");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, "\"[REDACTED]\"");
	}

	#[test]
	fn test_constant_time_eq() {
		let a = SecretString::from_str("topsecret");
		let b = SecretString::from_str("topsecret");
		let c = SecretString::from_str("topsecreX");
		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}
