use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Error response format shared by handlers
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

impl ErrorResponse {
	pub fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
			timestamp: chrono::Utc::now().timestamp(),
		}
	}
}

/// Shorthand for the handler error tuple
pub fn error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
	(status, Json(ErrorResponse::new(code, message)))
}
