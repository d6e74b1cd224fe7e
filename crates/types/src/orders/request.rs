//! Checkout request model and validation

use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use super::{OrderValidationError, OrderValidationResult};

/// Upper bound on distinct cart lines per checkout
pub const MAX_CART_LINES: usize = 100;

/// Upper bound on a single line's quantity
pub const MAX_LINE_QUANTITY: u32 = 999;

/// API request body for /api/v1/checkout
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
	/// Customer email; the customer document is upserted by address
	pub email: String,
	/// Optional display name for a new customer
	pub name: Option<String>,
	/// Cart contents, by sku
	pub items: Vec<CartItemInput>,
	/// ISO 4217 currency code, lowercase
	pub currency: String,
}

/// One cart line in a checkout request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CartItemInput {
	pub sku: String,
	pub quantity: u32,
}

impl CheckoutRequest {
	/// Validate the request shape before touching storage or vendors
	pub fn validate(&self) -> OrderValidationResult<()> {
		if self.items.is_empty() {
			return Err(OrderValidationError::EmptyCart);
		}
		if self.items.len() > MAX_CART_LINES {
			return Err(OrderValidationError::MissingRequiredField {
				field: format!("items (max {} lines)", MAX_CART_LINES),
			});
		}
		// A full RFC 5322 check belongs to the mail vendor; reject the
		// obviously broken addresses here.
		if !self.email.contains('@') || self.email.len() < 3 {
			return Err(OrderValidationError::InvalidEmail {
				email: self.email.clone(),
			});
		}
		if self.currency.len() != 3 {
			return Err(OrderValidationError::MissingRequiredField {
				field: "currency".to_string(),
			});
		}
		for item in &self.items {
			if item.sku.trim().is_empty() {
				return Err(OrderValidationError::MissingRequiredField {
					field: "items[].sku".to_string(),
				});
			}
			if item.quantity == 0 || item.quantity > MAX_LINE_QUANTITY {
				return Err(OrderValidationError::InvalidQuantity {
					sku: item.sku.clone(),
					quantity: item.quantity,
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn valid_request() -> CheckoutRequest {
		CheckoutRequest {
			email: "jo@example.com".to_string(),
			name: None,
			items: vec![CartItemInput {
				sku: "MUG-01".to_string(),
				quantity: 2,
			}],
			currency: "usd".to_string(),
		}
	}

	#[test]
	fn test_valid_request_passes() {
		assert!(valid_request().validate().is_ok());
	}

	#[test]
	fn test_empty_cart_rejected() {
		let mut req = valid_request();
		req.items.clear();
		assert!(matches!(
			req.validate(),
			Err(OrderValidationError::EmptyCart)
		));
	}

	#[test]
	fn test_zero_quantity_rejected() {
		let mut req = valid_request();
		req.items[0].quantity = 0;
		assert!(matches!(
			req.validate(),
			Err(OrderValidationError::InvalidQuantity { .. })
		));
	}

	#[test]
	fn test_bad_email_rejected() {
		let mut req = valid_request();
		req.email = "nope".to_string();
		assert!(matches!(
			req.validate(),
			Err(OrderValidationError::InvalidEmail { .. })
		));
	}
}
