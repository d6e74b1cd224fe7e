//! Checkout handler

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;

use crate::handlers::common::{error, ErrorResponse};
use crate::state::AppState;
use ops_service::CheckoutError;
use ops_types::{CheckoutRequest, OrderResponse};

/// Submit a checkout
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid cart", body = ErrorResponse),
        (status = 502, description = "Payment vendor failure", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "checkout"
))]
/// POST /api/v1/checkout - Validate the cart, create the payment intent,
/// persist the order
pub async fn post_checkout(
	State(state): State<AppState>,
	Json(request): Json<CheckoutRequest>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
	info!(
		"Received checkout for {} with {} line(s)",
		request.email,
		request.items.len()
	);

	let order = state
		.checkout_service
		.submit_checkout(&request)
		.await
		.map_err(|e| match e {
			CheckoutError::Validation(msg) => {
				error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.to_string())
			},
			CheckoutError::Gateway(e) => error(
				StatusCode::BAD_GATEWAY,
				"PAYMENT_GATEWAY_ERROR",
				e.to_string(),
			),
			CheckoutError::Storage(msg) => {
				error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg)
			},
		})?;

	info!("Created order {}", order.id);
	Ok(Json(OrderResponse::from(&order)))
}
