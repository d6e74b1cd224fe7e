//! Inbound webhook handlers
//!
//! Signature verification runs against the raw body before any JSON parse;
//! an unverifiable payload is never deserialized.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::Json,
};
use serde::Serialize;
use tracing::{info, warn};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::handlers::common::{error, ErrorResponse};
use crate::state::AppState;
use ops_storage::traits::CustomerStorage;
use ops_types::{ContentChangeEvent, Customer, DocId, IdentityEvent, PaymentEvent};

/// Header carrying the payment vendor's timestamped signature
pub const PAYMENT_SIGNATURE_HEADER: &str = "stripe-signature";

/// Header carrying the identity provider's plain HMAC
pub const IDENTITY_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Acknowledgement body returned to every vendor
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WebhookAck {
	pub received: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|v| v.to_str().ok())
}

/// Payment vendor events (intent succeeded / failed)
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/webhooks/payments",
    responses(
        (status = 200, description = "Event processed", body = WebhookAck),
        (status = 400, description = "Unparseable event", body = ErrorResponse),
        (status = 401, description = "Bad signature", body = ErrorResponse)
    ),
    tag = "webhooks"
))]
/// POST /webhooks/payments
pub async fn post_payment_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, Json<ErrorResponse>)> {
	let signature = header(&headers, PAYMENT_SIGNATURE_HEADER).ok_or_else(|| {
		error(
			StatusCode::UNAUTHORIZED,
			"SIGNATURE_MISSING",
			"Missing payment signature header",
		)
	})?;

	state
		.payment_signatures
		.verify_timestamped(signature, &body)
		.map_err(|e| {
			warn!("Payment webhook signature rejected: {}", e);
			error(StatusCode::UNAUTHORIZED, "SIGNATURE_INVALID", e.to_string())
		})?;

	let event: PaymentEvent = serde_json::from_slice(&body).map_err(|e| {
		error(
			StatusCode::BAD_REQUEST,
			"INVALID_PAYLOAD",
			format!("Unparseable payment event: {}", e),
		)
	})?;

	info!("Payment event {} ({})", event.id, event.event_type);

	match state.order_service.apply_payment_event(&event).await {
		Ok(Some(applied)) if applied.newly_paid => {
			// Confirmation failures must not bounce the webhook; the vendor
			// would retry and we would double-process.
			if let Err(e) = state
				.notify_service
				.send_order_confirmation(&applied.order)
				.await
			{
				warn!(
					"Confirmation email for order {} failed: {}",
					applied.order.id, e
				);
			}
		},
		Ok(Some(_)) => {},
		Ok(None) => {
			// Event for an intent this service never issued; acknowledged
			// so the vendor stops retrying.
		},
		Err(e) => {
			return Err(error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"EVENT_APPLY_FAILED",
				e.to_string(),
			))
		},
	}

	Ok(Json(WebhookAck { received: true }))
}

/// Identity provider events (account created / updated)
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/webhooks/identity",
    responses(
        (status = 200, description = "Event processed", body = WebhookAck),
        (status = 400, description = "Unparseable event", body = ErrorResponse),
        (status = 401, description = "Bad signature", body = ErrorResponse)
    ),
    tag = "webhooks"
))]
/// POST /webhooks/identity
pub async fn post_identity_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, Json<ErrorResponse>)> {
	let signature = header(&headers, IDENTITY_SIGNATURE_HEADER).unwrap_or_default();
	state
		.identity_signatures
		.verify_plain(signature, &body)
		.map_err(|e| {
			warn!("Identity webhook signature rejected: {}", e);
			error(StatusCode::UNAUTHORIZED, "SIGNATURE_INVALID", e.to_string())
		})?;

	let event: IdentityEvent = serde_json::from_slice(&body).map_err(|e| {
		error(
			StatusCode::BAD_REQUEST,
			"INVALID_PAYLOAD",
			format!("Unparseable identity event: {}", e),
		)
	})?;

	info!("Identity event {} for {}", event.event_type, event.user_id);

	// Upsert the customer: match by provider subject first, then by email
	let existing = match state.storage.get_customer_by_subject(&event.user_id).await {
		Ok(found) => found,
		Err(e) => {
			return Err(error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"STORAGE_ERROR",
				e.to_string(),
			))
		},
	};
	let existing = match existing {
		Some(customer) => Some(customer),
		None => state
			.storage
			.get_customer_by_email(&event.email)
			.await
			.map_err(|e| {
				error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					e.to_string(),
				)
			})?,
	};

	let result = match existing {
		Some(mut customer) => {
			customer.subject = Some(event.user_id.clone());
			customer.email = event.email.clone();
			if let Some(name) = &event.name {
				customer.name = Some(name.clone());
			}
			customer.updated_at = chrono::Utc::now();
			state.storage.update_customer(customer).await
		},
		None => {
			let mut customer = Customer::new(event.email.clone()).with_subject(event.user_id.clone());
			if let Some(name) = &event.name {
				customer = customer.with_name(name.clone());
			}
			state.storage.create_customer(customer).await
		},
	};

	result.map_err(|e| {
		error(
			StatusCode::INTERNAL_SERVER_ERROR,
			"STORAGE_ERROR",
			e.to_string(),
		)
	})?;

	Ok(Json(WebhookAck { received: true }))
}

/// Content-store change notifications
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/webhooks/content",
    responses(
        (status = 200, description = "Notification processed", body = WebhookAck),
        (status = 400, description = "Unparseable notification", body = ErrorResponse)
    ),
    tag = "webhooks"
))]
/// POST /webhooks/content - ids only; stored shipping quotes for touched
/// orders are invalidated so stale carts cannot buy stale rates
pub async fn post_content_webhook(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, Json<ErrorResponse>)> {
	let event: ContentChangeEvent = serde_json::from_slice(&body).map_err(|e| {
		error(
			StatusCode::BAD_REQUEST,
			"INVALID_PAYLOAD",
			format!("Unparseable change notification: {}", e),
		)
	})?;

	let mut invalidated = 0usize;
	for id in &event.ids {
		let doc_id = DocId::new(id.clone()).published();
		if doc_id.as_str().starts_with("order.") {
			match state.shipping_service.invalidate_quotes(&doc_id).await {
				Ok(count) => invalidated += count,
				Err(e) => warn!("Quote invalidation for {} failed: {}", doc_id, e),
			}
		}
	}

	info!(
		"Content change: {} id(s), {} quote(s) invalidated",
		event.ids.len(),
		invalidated
	);
	Ok(Json(WebhookAck { received: true }))
}
