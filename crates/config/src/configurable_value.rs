//! Values that resolve from environment variables or plain config text
//!
//! Vendor credentials are configured as `{"type": "env", "value": "STRIPE_SECRET_KEY"}`
//! (or the `env:NAME` string shorthand) so config files never carry secrets.

use ops_types::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A config value resolved at startup
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfigurableValue {
	#[serde(rename = "type")]
	pub value_type: ValueType,
	/// Environment variable name, or the literal value
	pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	/// Load from the environment variable named in `value`
	Env,
	/// Use `value` directly
	Plain,
}

impl ConfigurableValue {
	pub fn from_env(env_var_name: &str) -> Self {
		Self {
			value_type: ValueType::Env,
			value: env_var_name.to_string(),
		}
	}

	pub fn from_plain(plain_value: &str) -> Self {
		Self {
			value_type: ValueType::Plain,
			value: plain_value.to_string(),
		}
	}

	/// Resolve the actual value
	pub fn resolve(&self) -> Result<String, ConfigurableValueError> {
		match self.value_type {
			ValueType::Env => std::env::var(&self.value).map_err(|_| {
				ConfigurableValueError::EnvironmentVariableNotFound(self.value.clone())
			}),
			ValueType::Plain => Ok(self.value.clone()),
		}
	}

	/// Resolve into a zeroizing wrapper for credentials
	pub fn resolve_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		Ok(SecretString::new(self.resolve()?))
	}

	/// Plain values in config files are flagged at startup
	pub fn is_plain(&self) -> bool {
		matches!(self.value_type, ValueType::Plain)
	}

	/// Description safe to log
	pub fn description(&self) -> String {
		match self.value_type {
			ValueType::Env => format!("environment variable '{}'", self.value),
			ValueType::Plain => "configured plain value".to_string(),
		}
	}
}

/// Errors that can occur when resolving configurable values
#[derive(Debug, thiserror::Error)]
pub enum ConfigurableValueError {
	#[error("Environment variable '{0}' not found")]
	EnvironmentVariableNotFound(String),
}

// Never show resolved values in logs
impl fmt::Display for ConfigurableValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.value_type {
			ValueType::Env => write!(f, "env:{}", self.value),
			ValueType::Plain => write!(f, "plain:[REDACTED]"),
		}
	}
}

impl From<&str> for ConfigurableValue {
	fn from(value: &str) -> Self {
		match value.strip_prefix("env:") {
			Some(env_var) => Self::from_env(env_var),
			None => Self::from_plain(value),
		}
	}
}

impl From<String> for ConfigurableValue {
	fn from(value: String) -> Self {
		ConfigurableValue::from(value.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::env;

	#[test]
	fn test_plain_value_resolution() {
		let config = ConfigurableValue::from_plain("test-secret");
		assert_eq!(config.resolve().unwrap(), "test-secret");
		assert!(config.is_plain());
	}

	#[test]
	fn test_env_value_resolution() {
		env::set_var("OPS_TEST_SECRET", "secret-from-env");
		let config = ConfigurableValue::from_env("OPS_TEST_SECRET");
		assert_eq!(config.resolve().unwrap(), "secret-from-env");
		env::remove_var("OPS_TEST_SECRET");

		assert!(ConfigurableValue::from_env("OPS_MISSING_VAR")
			.resolve()
			.is_err());
	}

	#[test]
	fn test_string_shorthand() {
		let env_config = ConfigurableValue::from("env:STRIPE_SECRET_KEY");
		assert_eq!(env_config.value_type, ValueType::Env);
		assert_eq!(env_config.value, "STRIPE_SECRET_KEY");

		let plain_config = ConfigurableValue::from("sk_test_123");
		assert_eq!(plain_config.value_type, ValueType::Plain);
	}

	#[test]
	fn test_display_redacts_plain_values() {
		let config = ConfigurableValue::from_plain("sk_live_abc");
		assert_eq!(config.to_string(), "plain:[REDACTED]");
	}

	#[test]
	fn test_secret_resolution() {
		let config = ConfigurableValue::from_plain("whsec_test");
		let secret = config.resolve_secret().unwrap();
		assert_eq!(secret.expose_secret(), "whsec_test");
	}
}
