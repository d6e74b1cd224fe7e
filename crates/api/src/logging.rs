//! Per-request function-log recording
//!
//! The old platform wrote one log document per serverless invocation; the
//! equivalent here is one `FunctionLog` per handled request, recorded by
//! middleware after the handler ran. Health probes are excluded so the log
//! store is not flooded by the orchestrator.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use std::time::Instant;

use crate::state::AppState;
use ops_types::FunctionLog;

/// Derive the logged function name from method and path, e.g.
/// `POST /webhooks/payments` -> `webhooks.payments`
fn function_name(path: &str) -> String {
	path.trim_start_matches("/api/v1")
		.trim_matches('/')
		.replace('/', ".")
}

/// Middleware recording one function log per handled request
pub async fn record_request_log(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	let path = request.uri().path().to_string();
	let request_id = request
		.headers()
		.get("x-request-id")
		.and_then(|v| v.to_str().ok())
		.map(str::to_string);

	let start = Instant::now();
	let response = next.run(request).await;

	if !path.starts_with("/health") && !path.starts_with("/ready") {
		let mut log = FunctionLog::new(
			function_name(&path),
			response.status().as_u16(),
			start.elapsed().as_millis() as u64,
		);
		if let Some(request_id) = request_id {
			log = log.with_request_id(request_id);
		}
		state.request_logs.record(log).await;
	}

	response
}
