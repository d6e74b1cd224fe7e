//! Administrative ops handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use tracing::info;
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::handlers::common::{error, ErrorResponse};
use crate::state::AppState;
use ops_service::drains::DEFAULT_BATCH_SIZE;
use ops_types::DrainOutcome;

/// Request body for a drain flush
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FlushRequest {
	pub batch_size: Option<usize>,
}

/// Drain flush response
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FlushResponse {
	pub batch_size: usize,
	pub marked: bool,
	pub outcomes: Vec<DrainOutcome>,
}

/// Push pending function logs to every configured drain
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/drains/flush",
    request_body = FlushRequest,
    responses(
        (status = 200, description = "Delivery report", body = FlushResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "ops"
))]
/// POST /api/v1/drains/flush
pub async fn post_drain_flush(
	State(state): State<AppState>,
	body: Option<Json<FlushRequest>>,
) -> Result<Json<FlushResponse>, (StatusCode, Json<ErrorResponse>)> {
	let batch_size = body
		.and_then(|Json(req)| req.batch_size)
		.unwrap_or(DEFAULT_BATCH_SIZE);

	let report = state
		.drain_service
		.flush(batch_size)
		.await
		.map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, "DRAIN_ERROR", e.to_string()))?;

	info!(
		"Drain flush: {} logs, {} target(s), marked={}",
		report.batch_size,
		report.outcomes.len(),
		report.marked
	);

	Ok(Json(FlushResponse {
		batch_size: report.batch_size,
		marked: report.marked,
		outcomes: report.outcomes,
	}))
}
