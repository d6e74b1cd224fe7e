//! Order handlers

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
};
use tracing::debug;

use crate::handlers::common::{error, ErrorResponse};
use crate::pagination::CursorQuery;
use crate::state::AppState;
use ops_types::storage::PageRequest;
use ops_types::{DocId, OrderResponse, OrdersPageResponse};

/// Get an order by id
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order document id")),
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "orders"
))]
/// GET /api/v1/orders/:id
pub async fn get_order(
	State(state): State<AppState>,
	Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
	debug!("Fetching order {}", order_id);

	let order = state
		.order_service
		.get_order(&DocId::new(order_id.clone()))
		.await
		.map_err(|e| {
			error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"STORAGE_ERROR",
				e.to_string(),
			)
		})?
		.ok_or_else(|| {
			error(
				StatusCode::NOT_FOUND,
				"ORDER_NOT_FOUND",
				format!("Order {} not found", order_id),
			)
		})?;

	Ok(Json(OrderResponse::from(&order)))
}

/// List orders with cursor pagination
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("after" = Option<String>, Query, description = "Resume after this order id"),
        ("limit" = Option<usize>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "One page of orders", body = OrdersPageResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "orders"
))]
/// GET /api/v1/orders?after=<id>&limit=<n>
pub async fn get_orders(
	State(state): State<AppState>,
	Query(query): Query<CursorQuery>,
) -> Result<Json<OrdersPageResponse>, (StatusCode, Json<ErrorResponse>)> {
	let page_request = PageRequest {
		after: query.after,
		limit: query.limit,
	};

	let page = state
		.order_service
		.list_orders(&page_request)
		.await
		.map_err(|e| {
			error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"STORAGE_ERROR",
				e.to_string(),
			)
		})?;

	Ok(Json(OrdersPageResponse::from_page(
		page.items,
		page.next_cursor,
	)))
}
