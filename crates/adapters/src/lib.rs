//! Ops Adapters
//!
//! Vendor gateways for the commerce operations service: payments, shipping,
//! and transactional email, each behind the traits in `ops-types`.

pub mod client_cache;
pub mod resend_mailer;
pub mod shipengine_gateway;
pub mod stripe_gateway;

pub use client_cache::{global_client_cache, ClientCache, ClientConfig};
pub use ops_types::{GatewayError, GatewayResult, Mailer, PaymentGateway, ShippingGateway};
pub use resend_mailer::{ResendMailer, ResendMailerConfig};
pub use shipengine_gateway::{ShipEngineGateway, ShipEngineGatewayConfig};
pub use stripe_gateway::{StripeGateway, StripeGatewayConfig};
