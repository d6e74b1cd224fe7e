//! Ops Types
//!
//! Shared models and traits for the commerce operations service.
//! This crate contains all domain models organized by business entity.

pub mod auth;
pub mod customers;
pub mod gateways;
pub mod invoices;
pub mod logs;
pub mod models;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod storage;
pub mod webhooks;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

// Re-export commonly used types for convenience
pub use orders::{
	canonicalize_line_items, CanonicalizeOutcome, CartItemInput, CheckoutRequest, LegacyCartShape,
	LineItem, Order, OrderError, OrderResponse, OrderStatus, OrderValidationError,
	OrderValidationResult, OrdersPageResponse, PaymentMeta,
};

pub use customers::Customer;
pub use invoices::Invoice;
pub use products::Product;
pub use shipping::{
	Address, Parcel, Shipment, ShipmentStatus, ShippingError, ShippingQuote,
	DEFAULT_QUOTE_TTL_MINUTES,
};

pub use logs::{DrainOutcome, FunctionLog, LogLevel};

pub use gateways::{
	CreateIntentParams, GatewayError, GatewayResult, Mailer, OutboundEmail, PaymentGateway,
	PaymentIntent, PaymentIntentStatus, RateParams, RateQuote, Refund, ShippingGateway,
	ShippingLabel, TrackingStatus,
};

pub use webhooks::{ContentChangeEvent, IdentityEvent, PaymentEvent};

pub use models::{DocId, SecretString, DRAFT_PREFIX};

pub use auth::{
	ApiKeyAuthenticator, AuthContext, AuthError, AuthRequest, AuthenticationResult, Authenticator,
	MemoryRateLimiter, NoAuthenticator, Permission, RateLimitCheck, RateLimitError, RateLimiter,
	RateLimits,
};

pub use storage::{
	CustomerStorage, DocumentStore, InvoiceStorage, LogStorage, Mutation, OrderStorage, Page,
	PageRequest, Patch, ProductStorage, QuoteStorage, RawDocument, ShipmentStorage, StorageError,
	StorageResult, StorageStats, Transaction,
};
