//! Error types for order operations

use thiserror::Error;

use super::OrderStatus;

/// Validation errors for checkout requests
#[derive(Error, Debug)]
pub enum OrderValidationError {
	#[error("Cart is empty")]
	EmptyCart,

	#[error("Invalid quantity for sku {sku}: {quantity}")]
	InvalidQuantity { sku: String, quantity: u32 },

	#[error("Unknown product sku: {sku}")]
	UnknownSku { sku: String },

	#[error("Product {sku} is not active")]
	InactiveProduct { sku: String },

	#[error("Invalid email address: {email}")]
	InvalidEmail { email: String },

	#[error("Currency mismatch: cart has {cart}, product {sku} is priced in {product}")]
	CurrencyMismatch {
		cart: String,
		sku: String,
		product: String,
	},

	#[error("Missing required field: {field}")]
	MissingRequiredField { field: String },
}

/// General order-related errors
#[derive(Error, Debug)]
pub enum OrderError {
	#[error("Order validation failed: {0}")]
	Validation(#[from] OrderValidationError),

	#[error("Order not found: {order_id}")]
	NotFound { order_id: String },

	#[error("Invalid status transition: {from:?} -> {to:?}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },

	#[error("Order has no payment block: {order_id}")]
	PaymentMissing { order_id: String },

	#[error("Payment intent mismatch: expected {expected}, got {got}")]
	IntentMismatch { expected: String, got: String },

	#[error("Storage error: {0}")]
	Storage(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
