//! Commerce Ops Library
//!
//! An operations backend for a headless storefront: checkout, order
//! lifecycle, shipping, transactional email, inbound vendor webhooks, log
//! drains, and the order backfill machinery, over a pluggable document
//! store.

use ops_adapters::{
	ResendMailer, ResendMailerConfig, ShipEngineGateway, ShipEngineGatewayConfig, StripeGateway,
	StripeGatewayConfig,
};
use ops_api::auth::{auth_middleware, AuthConfig};
use ops_service::{
	CheckoutService, DrainService, DrainTargetSpec, NotifyService, OrderService,
	RequestLogService, ShippingService, SignatureService, SignatureTrait,
};

// Core domain types - the most commonly used types
pub use ops_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	Address,
	// Auth traits
	Authenticator,
	CheckoutRequest,
	Customer,
	DocId,
	FunctionLog,
	Invoice,
	// Gateway traits
	Mailer,
	// Primary domain entities
	Order,
	OrderError,
	OrderResponse,
	OrderStatus,
	Parcel,
	PaymentGateway,
	Permission,
	Product,
	RateLimiter,
	SecretString,
	Shipment,
	ShippingGateway,
	ShippingQuote,
};

// Service layer
pub use ops_service::{
	BackfillJob, BackfillOptions, BackfillReport, BackfillRunner, CheckoutError,
	OrderServiceError, ShippingServiceError,
};

// Storage layer
pub use ops_storage::{
	traits::{DocumentStore, OrderStorage, StorageError, StorageResult},
	MemoryStore,
};

#[cfg(feature = "content-api")]
pub use ops_storage::{ContentApiConfig, ContentApiStore};

// Storage traits module for advanced usage
pub mod traits {
	pub use ops_storage::traits::*;
}

// API layer
pub use ops_api::{create_router, AppState};
// Re-export auth implementations for convenience
pub use ops_types::auth::{ApiKeyAuthenticator, MemoryRateLimiter, NoAuthenticator};

// Config
pub use ops_config::{load_config, log_startup_complete, Settings};

// Module aliases for the crates underneath
pub mod models {
	pub use ops_types::*;
}

pub mod storage {
	pub use ops_storage::*;
}

pub mod config {
	pub use ops_config::*;
}

pub mod adapters {
	pub use ops_adapters::*;
}

pub mod api {
	pub use ops_api::*;
}

pub mod service {
	pub use ops_service::*;
}

pub mod mocks;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

// Re-export external dependencies for examples
pub use async_trait;

use ops_config::settings::LogFormat;
use ops_types::auth::AuthContext;
use ops_types::{Mailer as MailerTrait, RateLimits};

/// Builder pattern for configuring the operations service
pub struct OpsBuilder<S = MemoryStore, A = NoAuthenticator, R = MemoryRateLimiter>
where
	S: DocumentStore + 'static,
	A: Authenticator + 'static,
	R: RateLimiter + 'static,
{
	settings: Option<Settings>,
	storage: S,
	authenticator: Arc<A>,
	rate_limiter: Arc<R>,
	payments: Option<Arc<dyn PaymentGateway>>,
	shipping: Option<Arc<dyn ShippingGateway>>,
	mailer: Option<Arc<dyn MailerTrait>>,
}

impl Default for OpsBuilder<MemoryStore, NoAuthenticator, MemoryRateLimiter> {
	fn default() -> Self {
		Self::new()
	}
}

impl OpsBuilder<MemoryStore, NoAuthenticator, MemoryRateLimiter> {
	/// Create a new builder with default memory storage
	pub fn new() -> Self {
		Self::with_storage(MemoryStore::new())
	}
}

impl<S> OpsBuilder<S, NoAuthenticator, MemoryRateLimiter>
where
	S: DocumentStore + Clone + 'static,
{
	/// Create a new builder with the provided storage
	pub fn with_storage(storage: S) -> Self {
		OpsBuilder {
			settings: None,
			storage,
			authenticator: Arc::new(NoAuthenticator),
			rate_limiter: Arc::new(MemoryRateLimiter::new()),
			payments: None,
			shipping: None,
			mailer: None,
		}
	}
}

impl<S, A, R> OpsBuilder<S, A, R>
where
	S: DocumentStore + Clone + 'static,
	A: Authenticator + 'static,
	R: RateLimiter + 'static,
{
	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Set custom authenticator
	pub fn with_auth<NewA>(self, authenticator: NewA) -> OpsBuilder<S, NewA, R>
	where
		NewA: Authenticator + 'static,
	{
		OpsBuilder {
			settings: self.settings,
			storage: self.storage,
			authenticator: Arc::new(authenticator),
			rate_limiter: self.rate_limiter,
			payments: self.payments,
			shipping: self.shipping,
			mailer: self.mailer,
		}
	}

	/// Set custom rate limiter
	pub fn with_rate_limiter<NewR>(self, rate_limiter: NewR) -> OpsBuilder<S, A, NewR>
	where
		NewR: RateLimiter + 'static,
	{
		OpsBuilder {
			settings: self.settings,
			storage: self.storage,
			authenticator: self.authenticator,
			rate_limiter: Arc::new(rate_limiter),
			payments: self.payments,
			shipping: self.shipping,
			mailer: self.mailer,
		}
	}

	/// Override the payment gateway (mocks, custom vendors)
	pub fn with_payment_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
		self.payments = Some(gateway);
		self
	}

	/// Override the shipping gateway
	pub fn with_shipping_gateway(mut self, gateway: Arc<dyn ShippingGateway>) -> Self {
		self.shipping = Some(gateway);
		self
	}

	/// Override the mailer
	pub fn with_mailer(mut self, mailer: Arc<dyn MailerTrait>) -> Self {
		self.mailer = Some(mailer);
		self
	}

	/// Resolve a webhook secret, tolerating absence only when the vendor is
	/// disabled (mock/dev mode)
	fn webhook_secret(
		resolved: Result<SecretString, ops_config::ConfigurableValueError>,
		vendor_enabled: bool,
		what: &str,
	) -> Result<SecretString, Box<dyn std::error::Error>> {
		match resolved {
			Ok(secret) => Ok(secret),
			Err(e) if !vendor_enabled => {
				warn!(
					"{} not configured ({}); using a dev-only secret. Do NOT run production like this.",
					what, e
				);
				Ok(SecretString::from_str("dev-only-webhook-secret"))
			},
			Err(e) => Err(format!("{} must be configured: {}", what, e).into()),
		}
	}

	/// Build the configured vendor gateways, falling back to mocks for
	/// vendors disabled in settings
	fn build_gateways(
		&self,
		settings: &Settings,
	) -> Result<
		(
			Arc<dyn PaymentGateway>,
			Arc<dyn ShippingGateway>,
			Arc<dyn MailerTrait>,
		),
		Box<dyn std::error::Error>,
	> {
		let timeout_ms = settings.timeouts.per_vendor_ms;

		let payments: Arc<dyn PaymentGateway> = match &self.payments {
			Some(gateway) => Arc::clone(gateway),
			None if settings.vendors.stripe.enabled => {
				let secret_key = settings
					.vendors
					.stripe
					.secret_key
					.resolve_secret()
					.map_err(|e| format!("Stripe secret key: {}", e))?;
				Arc::new(StripeGateway::new(StripeGatewayConfig {
					endpoint: settings.vendors.stripe.endpoint.clone(),
					secret_key,
					timeout_ms,
				}))
			},
			None => {
				warn!("Payment vendor disabled; using mock gateway");
				Arc::new(mocks::MockPaymentGateway::new())
			},
		};

		let shipping: Arc<dyn ShippingGateway> = match &self.shipping {
			Some(gateway) => Arc::clone(gateway),
			None if settings.vendors.shipengine.enabled => {
				let api_key = settings
					.vendors
					.shipengine
					.api_key
					.resolve_secret()
					.map_err(|e| format!("ShipEngine API key: {}", e))?;
				Arc::new(ShipEngineGateway::new(ShipEngineGatewayConfig {
					endpoint: settings.vendors.shipengine.endpoint.clone(),
					api_key,
					timeout_ms,
				}))
			},
			None => {
				warn!("Shipping vendor disabled; using mock gateway");
				Arc::new(mocks::MockShippingGateway::new())
			},
		};

		let mailer: Arc<dyn MailerTrait> = match &self.mailer {
			Some(mailer) => Arc::clone(mailer),
			None if settings.vendors.resend.enabled => {
				let api_key = settings
					.vendors
					.resend
					.api_key
					.resolve_secret()
					.map_err(|e| format!("Resend API key: {}", e))?;
				Arc::new(ResendMailer::new(ResendMailerConfig {
					endpoint: settings.vendors.resend.endpoint.clone(),
					api_key,
					timeout_ms,
				}))
			},
			None => {
				warn!("Mail vendor disabled; using mock mailer");
				Arc::new(mocks::MockMailer::new())
			},
		};

		Ok((payments, shipping, mailer))
	}

	/// Initialize tracing with configuration-based settings
	fn init_tracing_from_settings(
		&self,
		settings: &Settings,
	) -> Result<(), Box<dyn std::error::Error>> {
		let log_level = &settings.logging.level;
		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

		match settings.logging.format {
			LogFormat::Json => {
				let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
			LogFormat::Pretty => {
				let subscriber = tracing_subscriber::fmt()
					.pretty()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
			LogFormat::Compact => {
				let subscriber = tracing_subscriber::fmt()
					.compact()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
		}

		info!(
			"Logging configuration applied: level={}, format={:?}, structured={}",
			settings.logging.level, settings.logging.format, settings.logging.structured
		);

		Ok(())
	}

	/// Assemble the router and application state
	pub async fn start(self) -> Result<(axum::Router, AppState), Box<dyn std::error::Error>> {
		let settings = self.settings.clone().unwrap_or_default();

		let (payments, shipping_gateway, mailer) = self.build_gateways(&settings)?;

		let payment_secret = Self::webhook_secret(
			settings.payment_webhook_secret(),
			settings.vendors.stripe.enabled,
			"Payment webhook secret (STRIPE_WEBHOOK_SECRET)",
		)?;
		// The identity hook tolerates a dev fallback; production configs
		// resolve it from the environment.
		let identity_secret = Self::webhook_secret(
			settings.identity_webhook_secret(),
			false,
			"Identity webhook secret (IDENTITY_WEBHOOK_SECRET)",
		)?;

		let storage_arc: Arc<dyn DocumentStore> = Arc::new(self.storage.clone());

		let ship_from = Address {
			name: settings.vendors.shipengine.ship_from.name.clone(),
			line1: settings.vendors.shipengine.ship_from.line1.clone(),
			line2: None,
			city: settings.vendors.shipengine.ship_from.city.clone(),
			state: settings.vendors.shipengine.ship_from.state.clone(),
			postal_code: settings.vendors.shipengine.ship_from.postal_code.clone(),
			country: settings.vendors.shipengine.ship_from.country.clone(),
		};

		let mut drain_targets = Vec::with_capacity(settings.drains.len());
		for drain in &settings.drains {
			let token = match &drain.token {
				Some(value) => Some(
					value
						.resolve_secret()
						.map_err(|e| format!("Drain '{}' token: {}", drain.name, e))?,
				),
				None => None,
			};
			drain_targets.push(DrainTargetSpec {
				name: drain.name.clone(),
				endpoint: drain.endpoint.clone(),
				token,
			});
		}

		let app_state = AppState {
			checkout_service: Arc::new(CheckoutService::new(
				Arc::clone(&storage_arc),
				Arc::clone(&payments),
			)),
			order_service: Arc::new(OrderService::new(Arc::clone(&storage_arc))),
			shipping_service: Arc::new(ShippingService::new(
				Arc::clone(&storage_arc),
				Arc::clone(&shipping_gateway),
				ship_from,
			)),
			notify_service: Arc::new(NotifyService::new(
				Arc::clone(&storage_arc),
				Arc::clone(&mailer),
				settings.vendors.resend.from_address.clone(),
			)),
			drain_service: Arc::new(DrainService::new(
				Arc::clone(&storage_arc),
				drain_targets,
				settings.timeouts.global_ms,
			)),
			request_logs: Arc::new(RequestLogService::new(Arc::clone(&storage_arc))),
			payment_signatures: Arc::new(SignatureService::new(payment_secret))
				as Arc<dyn SignatureTrait>,
			identity_signatures: Arc::new(SignatureService::new(identity_secret))
				as Arc<dyn SignatureTrait>,
			storage: storage_arc,
		};

		// Router with auth applied outside the route layers
		let auth_config = AuthConfig {
			enable_rate_limiting: settings.environment.rate_limiting.enabled,
			default_rate_limits: Some(RateLimits {
				requests_per_minute: settings.environment.rate_limiting.requests_per_minute,
				burst_size: settings.environment.rate_limiting.burst_size,
			}),
			..AuthConfig::default()
		};
		let authenticator = Arc::clone(&self.authenticator);
		let rate_limiter = Arc::clone(&self.rate_limiter);
		let router = create_router(app_state.clone())
			.layer(axum::middleware::from_fn(
				move |request: axum::extract::Request, next: axum::middleware::Next| {
					let authenticator = Arc::clone(&authenticator);
					let rate_limiter = Arc::clone(&rate_limiter);
					let config = auth_config.clone();
					async move {
						auth_middleware(authenticator, rate_limiter, config, request, next).await
					}
				},
			))
			.with_state(app_state.clone());

		Ok((router, app_state))
	}

	/// Start the complete server with all defaults and setup: .env loading,
	/// configuration, tracing, background tasks, bind and serve.
	pub async fn start_server(mut self) -> Result<(), Box<dyn std::error::Error>> {
		dotenvy::dotenv().ok();

		let using_provided_settings = self.settings.is_some();
		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config().unwrap_or_default(),
		};

		self.init_tracing_from_settings(&settings)?;

		ops_config::log_service_info();
		info!(
			"Using configuration: loaded from {}",
			if using_provided_settings {
				"provided settings"
			} else {
				"config file or defaults"
			}
		);
		ops_config::log_configuration(&settings);

		let bind_addr = settings.bind_address();
		let addr: SocketAddr = bind_addr
			.parse()
			.map_err(|e| format!("Invalid bind address '{}': {}", bind_addr, e))?;

		let rate_cfg = settings.environment.rate_limiting.clone();
		self.settings = Some(settings);
		let (app, app_state) = self.start().await?;

		// Storage-owned background work (quote TTL sweeping)
		app_state.storage.start_background_tasks().await?;

		let listener = tokio::net::TcpListener::bind(addr).await?;
		log_startup_complete(&bind_addr);
		info!("API endpoints available:");
		info!("  GET  /health");
		info!("  GET  /ready");
		info!("  POST /api/v1/checkout");
		info!("  GET  /api/v1/orders");
		info!("  GET  /api/v1/orders/{{id}}");
		info!("  POST /api/v1/shipping/rates");
		info!("  POST /api/v1/shipping/labels");
		info!("  GET  /api/v1/shipments/{{id}}/tracking");
		info!("  POST /api/v1/drains/flush");
		info!("  POST /webhooks/payments");
		info!("  POST /webhooks/identity");
		info!("  POST /webhooks/content");
		if cfg!(feature = "openapi") {
			info!("  GET  /swagger-ui");
			info!("  GET  /api-docs/openapi.json");
		}

		// Apply global rate limiting based on settings at the make_service level
		if rate_cfg.enabled {
			use std::time::Duration;
			use tower::limit::RateLimitLayer;
			use tower::ServiceBuilder;
			let make_svc = ServiceBuilder::new()
				.layer(RateLimitLayer::new(
					rate_cfg.requests_per_minute as u64,
					Duration::from_secs(60),
				))
				.service(app.into_make_service());
			axum::serve(listener, make_svc).await?;
		} else {
			axum::serve(listener, app).await?;
		}

		Ok(())
	}
}

/// Build an API-key authenticator from the keys configured in settings
pub fn api_key_authenticator_from_settings(
	settings: &Settings,
) -> Result<ApiKeyAuthenticator, Box<dyn std::error::Error>> {
	let auth = ApiKeyAuthenticator::new();
	for (index, key) in settings.security.api_keys.iter().enumerate() {
		let resolved = key
			.resolve()
			.map_err(|e| format!("API key #{}: {}", index + 1, e))?;
		let context = AuthContext::new(format!("api-key-{}", index + 1))
			.with_permission(Permission::ReadOrders)
			.with_permission(Permission::SubmitCheckout)
			.with_permission(Permission::ManageShipping)
			.with_permission(Permission::RunOps)
			.with_permission(Permission::HealthCheck);
		auth.add_key(resolved, context);
	}
	Ok(auth)
}
