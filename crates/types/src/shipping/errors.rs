//! Error types for shipping operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShippingError {
	#[error("Shipping quote not found: {quote_id}")]
	QuoteNotFound { quote_id: String },

	#[error("Shipping quote {quote_id} has expired")]
	QuoteExpired { quote_id: String },

	#[error("Shipment not found: {shipment_id}")]
	NotFound { shipment_id: String },

	#[error("Quote {quote_id} does not belong to order {order_id}")]
	QuoteOrderMismatch { quote_id: String, order_id: String },

	#[error("Invalid address: {reason}")]
	InvalidAddress { reason: String },

	#[error("Storage error: {0}")]
	Storage(String),
}
