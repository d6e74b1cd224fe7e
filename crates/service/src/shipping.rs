//! Shipping service
//!
//! Rates are fetched from the vendor and persisted as quote documents with a
//! TTL; labels are only purchased against a stored, unexpired quote so the
//! price shown is the price paid.

use std::sync::Arc;

use ops_storage::traits::{DocumentStore, OrderStorage, QuoteStorage, ShipmentStorage};
use ops_types::chrono::Utc;
use ops_types::{
	Address, DocId, GatewayError, OrderStatus, Parcel, RateParams, Shipment, ShipmentStatus,
	ShippingGateway, ShippingQuote,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ShippingServiceError {
	#[error("order not found: {0}")]
	OrderNotFound(String),
	#[error("shipping quote not found: {0}")]
	QuoteNotFound(String),
	#[error("shipping quote {0} has expired")]
	QuoteExpired(String),
	#[error("quote {quote_id} does not belong to order {order_id}")]
	QuoteOrderMismatch { quote_id: String, order_id: String },
	#[error("shipment not found: {0}")]
	ShipmentNotFound(String),
	#[error("shipping gateway error: {0}")]
	Gateway(#[from] GatewayError),
	#[error("storage error: {0}")]
	Storage(String),
}

#[derive(Clone)]
pub struct ShippingService {
	storage: Arc<dyn DocumentStore>,
	gateway: Arc<dyn ShippingGateway>,
	/// Warehouse address labels ship from
	ship_from: Address,
}

impl ShippingService {
	pub fn new(
		storage: Arc<dyn DocumentStore>,
		gateway: Arc<dyn ShippingGateway>,
		ship_from: Address,
	) -> Self {
		Self {
			storage,
			gateway,
			ship_from,
		}
	}

	/// Fetch carrier rates for an order and persist them as quotes
	pub async fn quote_rates(
		&self,
		order_id: &DocId,
		ship_to: Address,
		parcel: Parcel,
	) -> Result<Vec<ShippingQuote>, ShippingServiceError> {
		let order = self
			.storage
			.get_order(order_id)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?
			.ok_or_else(|| ShippingServiceError::OrderNotFound(order_id.to_string()))?;

		let params = RateParams {
			ship_to,
			ship_from: self.ship_from.clone(),
			parcel,
		};
		let rates = self.gateway.fetch_rates(&params).await?;

		let mut quotes = Vec::with_capacity(rates.len());
		for rate in rates {
			let mut quote = ShippingQuote::new(
				order.id.clone(),
				rate.carrier_id,
				rate.service_code,
				rate.amount,
				rate.currency,
			);
			if let Some(days) = rate.delivery_days {
				quote = quote.with_delivery_days(days);
			}
			self.storage
				.add_quote(quote.clone())
				.await
				.map_err(|e| ShippingServiceError::Storage(e.to_string()))?;
			quotes.push(quote);
		}

		info!("Stored {} rate quotes for order {}", quotes.len(), order.id);
		Ok(quotes)
	}

	/// Purchase a label for a stored quote and create the shipment document
	pub async fn purchase_label(
		&self,
		order_id: &DocId,
		quote_id: &DocId,
		ship_to: Address,
		parcel: Parcel,
	) -> Result<Shipment, ShippingServiceError> {
		let mut order = self
			.storage
			.get_order(order_id)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?
			.ok_or_else(|| ShippingServiceError::OrderNotFound(order_id.to_string()))?;

		let quote = self
			.storage
			.get_quote(quote_id)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?
			.ok_or_else(|| ShippingServiceError::QuoteNotFound(quote_id.to_string()))?;

		if quote.order != *order_id {
			return Err(ShippingServiceError::QuoteOrderMismatch {
				quote_id: quote_id.to_string(),
				order_id: order_id.to_string(),
			});
		}
		// Never silently re-price: an expired quote is the caller's problem
		if quote.is_expired() {
			return Err(ShippingServiceError::QuoteExpired(quote_id.to_string()));
		}

		let params = RateParams {
			ship_to,
			ship_from: self.ship_from.clone(),
			parcel,
		};
		let label = self
			.gateway
			.purchase_label(&quote.carrier_id, &quote.service_code, &params)
			.await?;

		let shipment = Shipment::new(
			order.id.clone(),
			label.carrier_id,
			label.service_code,
			label.label_id,
			label.tracking_number,
		);
		let shipment = match label.label_url {
			Some(url) => shipment.with_label_url(url),
			None => shipment,
		};

		self.storage
			.create_shipment(shipment.clone())
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?;

		// Fulfilment only moves paid orders; unpaid orders keep their status
		// and just gain the shipment reference.
		order.shipping_quote = Some(quote.id.clone());
		if order.status == OrderStatus::Paid {
			if let Err(e) = order.transition_to(OrderStatus::Fulfilled) {
				warn!("Order {} not moved to fulfilled: {}", order.id, e);
			}
		}
		order.updated_at = Utc::now();
		self.storage
			.update_order(order)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?;

		info!(
			"Created shipment {} for order {} (tracking {})",
			shipment.id, order_id, shipment.tracking_number
		);
		Ok(shipment)
	}

	/// Refresh tracking state from the carrier
	pub async fn refresh_tracking(
		&self,
		shipment_id: &DocId,
	) -> Result<Shipment, ShippingServiceError> {
		let mut shipment = self
			.storage
			.get_shipment(shipment_id)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))?
			.ok_or_else(|| ShippingServiceError::ShipmentNotFound(shipment_id.to_string()))?;

		let tracking = self
			.gateway
			.track(&shipment.carrier_id, &shipment.tracking_number)
			.await?;

		let status = match tracking.status_code.as_str() {
			"DE" => ShipmentStatus::Delivered,
			"IT" | "AC" => ShipmentStatus::InTransit,
			"EX" | "UN" => ShipmentStatus::Exception,
			_ => shipment.status,
		};

		if status != shipment.status {
			info!(
				"Shipment {} moved {:?} -> {:?}",
				shipment.id, shipment.status, status
			);
			shipment.status = status;
			shipment.updated_at = Utc::now();
			self.storage
				.update_shipment(shipment.clone())
				.await
				.map_err(|e| ShippingServiceError::Storage(e.to_string()))?;
		}

		Ok(shipment)
	}

	/// Drop stored quotes for an order, e.g. after a content change touched it
	pub async fn invalidate_quotes(&self, order_id: &DocId) -> Result<usize, ShippingServiceError> {
		self.storage
			.remove_quotes_for_order(order_id)
			.await
			.map_err(|e| ShippingServiceError::Storage(e.to_string()))
	}
}
