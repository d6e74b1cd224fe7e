//! Vendor gateway traits, models, and errors

pub mod errors;
pub mod models;
pub mod traits;

pub use errors::{GatewayError, GatewayResult};
pub use models::{
	CreateIntentParams, OutboundEmail, PaymentIntent, PaymentIntentStatus, RateParams, RateQuote,
	Refund, ShippingLabel, TrackingStatus,
};
pub use traits::{Mailer, PaymentGateway, ShippingGateway};
