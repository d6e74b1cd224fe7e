//! Configuration settings structures

use crate::{configurable_value::ConfigurableValue, ConfigurableValueError};
use ops_types::SecretString;
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
	pub server: ServerSettings,
	pub content_store: ContentStoreSettings,
	pub vendors: VendorSettings,
	/// Log-drain webhook targets
	#[serde(default)]
	pub drains: Vec<DrainTarget>,
	pub timeouts: TimeoutSettings,
	pub environment: EnvironmentSettings,
	pub logging: LoggingSettings,
	pub security: SecuritySettings,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
}

/// Content-store data API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContentStoreSettings {
	pub endpoint: String,
	pub dataset: String,
	/// Data API version date, e.g. `2024-01-01`
	pub api_version: String,
	pub token: ConfigurableValue,
}

/// Vendor gateway configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VendorSettings {
	pub stripe: StripeSettings,
	pub shipengine: ShipEngineSettings,
	pub resend: ResendSettings,
}

/// Payment vendor configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StripeSettings {
	pub enabled: bool,
	pub secret_key: ConfigurableValue,
	/// Signing secret for inbound payment webhooks
	pub webhook_secret: ConfigurableValue,
	#[serde(default = "default_stripe_endpoint")]
	pub endpoint: String,
}

fn default_stripe_endpoint() -> String {
	"https://api.stripe.com".to_string()
}

/// Shipping vendor configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipEngineSettings {
	pub enabled: bool,
	pub api_key: ConfigurableValue,
	#[serde(default = "default_shipengine_endpoint")]
	pub endpoint: String,
	/// Warehouse address labels ship from
	pub ship_from: ShipFromSettings,
}

fn default_shipengine_endpoint() -> String {
	"https://api.shipengine.com".to_string()
}

/// Origin address for rate requests and labels
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShipFromSettings {
	pub name: String,
	pub line1: String,
	pub city: String,
	#[serde(default)]
	pub state: Option<String>,
	pub postal_code: String,
	pub country: String,
}

/// Email vendor configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResendSettings {
	pub enabled: bool,
	pub api_key: ConfigurableValue,
	pub from_address: String,
	#[serde(default = "default_resend_endpoint")]
	pub endpoint: String,
}

fn default_resend_endpoint() -> String {
	"https://api.resend.com".to_string()
}

/// One log-drain webhook target
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DrainTarget {
	pub name: String,
	pub endpoint: String,
	/// Optional bearer token for the target
	#[serde(default)]
	pub token: Option<ConfigurableValue>,
}

/// Timeout configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeoutSettings {
	/// Per-vendor-call timeout in milliseconds
	pub per_vendor_ms: u64,
	/// Global timeout for fan-out work (drain delivery) in milliseconds
	pub global_ms: u64,
	/// Request timeout for HTTP clients
	pub request_ms: u64,
}

/// Environment-specific settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnvironmentSettings {
	pub profile: EnvironmentProfile,
	pub debug: bool,
	pub rate_limiting: RateLimitSettings,
}

/// Environment profiles
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProfile {
	Development,
	Staging,
	Production,
}

/// Rate limiting configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitSettings {
	pub enabled: bool,
	pub requests_per_minute: u32,
	pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Security configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecuritySettings {
	/// HMAC secret for the identity webhook signature
	pub identity_webhook_secret: ConfigurableValue,
	/// API keys accepted by the admin/ops endpoints
	#[serde(default)]
	pub api_keys: Vec<ConfigurableValue>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			server: ServerSettings {
				host: "0.0.0.0".to_string(),
				port: 3000,
			},
			content_store: ContentStoreSettings {
				endpoint: "http://localhost:3333".to_string(),
				dataset: "development".to_string(),
				api_version: "2024-01-01".to_string(),
				token: ConfigurableValue::from_env("CONTENT_STORE_TOKEN"),
			},
			vendors: VendorSettings {
				stripe: StripeSettings {
					enabled: false,
					secret_key: ConfigurableValue::from_env("STRIPE_SECRET_KEY"),
					webhook_secret: ConfigurableValue::from_env("STRIPE_WEBHOOK_SECRET"),
					endpoint: default_stripe_endpoint(),
				},
				shipengine: ShipEngineSettings {
					enabled: false,
					api_key: ConfigurableValue::from_env("SHIPENGINE_API_KEY"),
					endpoint: default_shipengine_endpoint(),
					ship_from: ShipFromSettings {
						name: "Warehouse".to_string(),
						line1: "1 Warehouse Way".to_string(),
						city: "Reno".to_string(),
						state: Some("NV".to_string()),
						postal_code: "89501".to_string(),
						country: "US".to_string(),
					},
				},
				resend: ResendSettings {
					enabled: false,
					api_key: ConfigurableValue::from_env("RESEND_API_KEY"),
					from_address: "orders@example.com".to_string(),
					endpoint: default_resend_endpoint(),
				},
			},
			drains: Vec::new(),
			timeouts: TimeoutSettings {
				per_vendor_ms: 5000,
				global_ms: 10000,
				request_ms: 5000,
			},
			environment: EnvironmentSettings {
				profile: EnvironmentProfile::Development,
				debug: true,
				rate_limiting: RateLimitSettings {
					enabled: false,
					requests_per_minute: 100,
					burst_size: 10,
				},
			},
			logging: LoggingSettings {
				level: "info".to_string(),
				format: LogFormat::Pretty,
				structured: false,
			},
			security: SecuritySettings {
				identity_webhook_secret: ConfigurableValue::from_env("IDENTITY_WEBHOOK_SECRET"),
				api_keys: Vec::new(),
			},
		}
	}
}

impl Settings {
	/// Get server bind address
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.server.host, self.server.port)
	}

	/// Check if running in production
	pub fn is_production(&self) -> bool {
		self.environment.profile == EnvironmentProfile::Production
	}

	/// Check if debug mode is enabled
	pub fn is_debug(&self) -> bool {
		self.environment.debug && !self.is_production()
	}

	/// Names of vendors enabled in this configuration
	pub fn enabled_vendors(&self) -> Vec<&'static str> {
		let mut enabled = Vec::new();
		if self.vendors.stripe.enabled {
			enabled.push("stripe");
		}
		if self.vendors.shipengine.enabled {
			enabled.push("shipengine");
		}
		if self.vendors.resend.enabled {
			enabled.push("resend");
		}
		enabled
	}

	/// Resolve the payment webhook signing secret
	pub fn payment_webhook_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		self.vendors.stripe.webhook_secret.resolve_secret()
	}

	/// Resolve the identity webhook signing secret
	pub fn identity_webhook_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		self.security.identity_webhook_secret.resolve_secret()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_have_no_vendors_enabled() {
		let settings = Settings::default();
		assert!(settings.enabled_vendors().is_empty());
		assert_eq!(settings.bind_address(), "0.0.0.0:3000");
		assert!(settings.is_debug());
	}

	#[test]
	fn test_enabled_vendor_listing() {
		let mut settings = Settings::default();
		settings.vendors.stripe.enabled = true;
		settings.vendors.resend.enabled = true;
		assert_eq!(settings.enabled_vendors(), vec!["stripe", "resend"]);
	}
}
