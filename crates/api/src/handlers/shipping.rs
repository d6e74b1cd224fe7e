//! Shipping handlers

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::handlers::common::{error, ErrorResponse};
use crate::state::AppState;
use ops_service::ShippingServiceError;
use ops_types::{Address, DocId, Parcel, Shipment, ShippingQuote};

/// Request body for rate fetching
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RatesRequest {
	pub order_id: String,
	pub ship_to: Address,
	pub parcel: Parcel,
}

/// Response for rate fetching
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
	pub quotes: Vec<ShippingQuote>,
	pub total_quotes: usize,
}

/// Request body for label purchase
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelRequest {
	pub order_id: String,
	pub quote_id: String,
	pub ship_to: Address,
	pub parcel: Parcel,
}

fn map_shipping_error(e: ShippingServiceError) -> (StatusCode, Json<ErrorResponse>) {
	match e {
		ShippingServiceError::OrderNotFound(id) => error(
			StatusCode::NOT_FOUND,
			"ORDER_NOT_FOUND",
			format!("Order {} not found", id),
		),
		ShippingServiceError::QuoteNotFound(id) => error(
			StatusCode::NOT_FOUND,
			"QUOTE_NOT_FOUND",
			format!("Shipping quote {} not found", id),
		),
		ShippingServiceError::QuoteExpired(id) => error(
			StatusCode::BAD_REQUEST,
			"QUOTE_EXPIRED",
			format!("Shipping quote {} has expired", id),
		),
		ShippingServiceError::QuoteOrderMismatch { quote_id, order_id } => error(
			StatusCode::BAD_REQUEST,
			"QUOTE_ORDER_MISMATCH",
			format!("Quote {} does not belong to order {}", quote_id, order_id),
		),
		ShippingServiceError::ShipmentNotFound(id) => error(
			StatusCode::NOT_FOUND,
			"SHIPMENT_NOT_FOUND",
			format!("Shipment {} not found", id),
		),
		ShippingServiceError::Gateway(e) => error(
			StatusCode::BAD_GATEWAY,
			"SHIPPING_GATEWAY_ERROR",
			e.to_string(),
		),
		ShippingServiceError::Storage(msg) => {
			error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg)
		},
	}
}

/// Fetch carrier rates for an order
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/shipping/rates",
    request_body = RatesRequest,
    responses(
        (status = 200, description = "Stored rate quotes", body = RatesResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 502, description = "Shipping vendor failure", body = ErrorResponse)
    ),
    tag = "shipping"
))]
/// POST /api/v1/shipping/rates
pub async fn post_rates(
	State(state): State<AppState>,
	Json(request): Json<RatesRequest>,
) -> Result<Json<RatesResponse>, (StatusCode, Json<ErrorResponse>)> {
	let quotes = state
		.shipping_service
		.quote_rates(
			&DocId::new(request.order_id),
			request.ship_to,
			request.parcel,
		)
		.await
		.map_err(map_shipping_error)?;

	Ok(Json(RatesResponse {
		total_quotes: quotes.len(),
		quotes,
	}))
}

/// Purchase a label for a stored quote
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/shipping/labels",
    request_body = LabelRequest,
    responses(
        (status = 200, description = "Shipment created", body = Shipment),
        (status = 400, description = "Quote expired or mismatched", body = ErrorResponse),
        (status = 404, description = "Order or quote not found", body = ErrorResponse),
        (status = 502, description = "Shipping vendor failure", body = ErrorResponse)
    ),
    tag = "shipping"
))]
/// POST /api/v1/shipping/labels
pub async fn post_labels(
	State(state): State<AppState>,
	Json(request): Json<LabelRequest>,
) -> Result<Json<Shipment>, (StatusCode, Json<ErrorResponse>)> {
	let shipment = state
		.shipping_service
		.purchase_label(
			&DocId::new(request.order_id),
			&DocId::new(request.quote_id),
			request.ship_to,
			request.parcel,
		)
		.await
		.map_err(map_shipping_error)?;

	info!("Purchased label {}", shipment.label_id);
	Ok(Json(shipment))
}

/// Refresh tracking for a shipment
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/shipments/{id}/tracking",
    params(("id" = String, Path, description = "Shipment document id")),
    responses(
        (status = 200, description = "Tracking refreshed", body = TrackingResponse),
        (status = 404, description = "Shipment not found", body = ErrorResponse),
        (status = 502, description = "Shipping vendor failure", body = ErrorResponse)
    ),
    tag = "shipping"
))]
/// GET /api/v1/shipments/:id/tracking
pub async fn get_tracking(
	State(state): State<AppState>,
	Path(shipment_id): Path<String>,
) -> Result<Json<TrackingResponse>, (StatusCode, Json<ErrorResponse>)> {
	let shipment = state
		.shipping_service
		.refresh_tracking(&DocId::new(shipment_id))
		.await
		.map_err(map_shipping_error)?;

	Ok(Json(TrackingResponse {
		shipment_id: shipment.id.to_string(),
		tracking_number: shipment.tracking_number.clone(),
		status: format!("{:?}", shipment.status),
	}))
}

/// Tracking refresh response
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
	pub shipment_id: String,
	pub tracking_number: String,
	pub status: String,
}
