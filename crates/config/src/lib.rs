//! Ops Config
//!
//! Configuration loading and settings for the commerce operations service.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::load_config;
pub use settings::{
	ContentStoreSettings, DrainTarget, EnvironmentProfile, EnvironmentSettings, LogFormat,
	LoggingSettings, RateLimitSettings, ResendSettings, SecuritySettings, ServerSettings,
	Settings, ShipEngineSettings, ShipFromSettings, StripeSettings, TimeoutSettings,
	VendorSettings,
};
pub use startup_logger::{
	log_configuration, log_service_info, log_service_shutdown, log_startup_complete,
};
