//! Shipping gateway over the ShipEngine REST API
//!
//! JSON requests against `/v1/rates`, `/v1/labels`, and `/v1/tracking`,
//! authenticated with the `API-Key` header. The vendor quotes amounts in
//! major currency units; everything leaves here in minor units.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ops_types::{
	Address, GatewayError, GatewayResult, Parcel, RateParams, RateQuote, SecretString,
	ShippingGateway, ShippingLabel, TrackingStatus,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client_cache::{ClientCache, ClientConfig};

const VENDOR: &str = "shipengine";

/// Configuration for the ShipEngine gateway
#[derive(Debug, Clone)]
pub struct ShipEngineGatewayConfig {
	pub endpoint: String,
	pub api_key: SecretString,
	pub timeout_ms: u64,
}

/// ShipEngine-backed implementation of [`ShippingGateway`]
#[derive(Debug)]
pub struct ShipEngineGateway {
	config: ShipEngineGatewayConfig,
	cache: ClientCache,
}

#[derive(Debug, Deserialize)]
struct MoneyObject {
	/// Major currency units
	amount: f64,
	currency: String,
}

impl MoneyObject {
	fn minor_units(&self) -> i64 {
		(self.amount * 100.0).round() as i64
	}
}

#[derive(Debug, Deserialize)]
struct RatesEnvelope {
	rate_response: RateResponse,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
	rates: Vec<RateObject>,
}

#[derive(Debug, Deserialize)]
struct RateObject {
	carrier_id: String,
	service_code: String,
	shipping_amount: MoneyObject,
	#[serde(default)]
	delivery_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LabelObject {
	label_id: String,
	tracking_number: String,
	carrier_id: String,
	service_code: String,
	shipment_cost: MoneyObject,
	#[serde(default)]
	label_download: Option<LabelDownload>,
}

#[derive(Debug, Deserialize)]
struct LabelDownload {
	#[serde(default)]
	pdf: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackingObject {
	tracking_number: String,
	status_code: String,
	#[serde(default)]
	status_description: Option<String>,
	#[serde(default)]
	estimated_delivery_date: Option<DateTime<Utc>>,
}

impl ShipEngineGateway {
	pub fn new(config: ShipEngineGatewayConfig) -> Self {
		Self {
			config,
			cache: ClientCache::for_gateway(),
		}
	}

	pub fn with_cache(config: ShipEngineGatewayConfig, cache: ClientCache) -> Self {
		Self { config, cache }
	}

	fn client(&self) -> GatewayResult<Arc<reqwest::Client>> {
		let client_config = ClientConfig::for_vendor(VENDOR, &self.config.endpoint)
			.with_header("API-Key", self.config.api_key.expose_secret());
		self.cache.get_client(&client_config)
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
	}

	fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
		if e.is_timeout() {
			GatewayError::Timeout {
				timeout_ms: self.config.timeout_ms,
			}
		} else {
			GatewayError::Http(e)
		}
	}

	async fn read_error(response: reqwest::Response) -> GatewayError {
		let status = response.status().as_u16();
		let message = response.text().await.unwrap_or_default();
		GatewayError::api_failure(VENDOR, status, message)
	}

	fn address_json(address: &Address) -> Value {
		json!({
			"name": address.name,
			"address_line1": address.line1,
			"address_line2": address.line2,
			"city_locality": address.city,
			"state_province": address.state,
			"postal_code": address.postal_code,
			"country_code": address.country,
		})
	}

	fn parcel_json(parcel: &Parcel) -> Value {
		json!({
			"weight": {"value": parcel.weight_grams, "unit": "gram"},
			"dimensions": {
				"length": parcel.length_cm,
				"width": parcel.width_cm,
				"height": parcel.height_cm,
				"unit": "centimeter",
			},
		})
	}

	fn shipment_json(params: &RateParams, service_code: Option<&str>) -> Value {
		let mut shipment = json!({
			"ship_to": Self::address_json(&params.ship_to),
			"ship_from": Self::address_json(&params.ship_from),
			"packages": [Self::parcel_json(&params.parcel)],
		});
		if let Some(code) = service_code {
			shipment["service_code"] = json!(code);
		}
		shipment
	}
}

#[async_trait]
impl ShippingGateway for ShipEngineGateway {
	async fn fetch_rates(&self, params: &RateParams) -> GatewayResult<Vec<RateQuote>> {
		debug!(
			"Fetching rates for {} -> {}",
			params.ship_from.postal_code, params.ship_to.postal_code
		);

		let body = json!({
			"rate_options": {"carrier_ids": []},
			"shipment": Self::shipment_json(params, None),
		});

		let response = self
			.client()?
			.post(self.url("/v1/rates"))
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.json(&body)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let envelope: RatesEnvelope = response.json().await.map_err(GatewayError::Http)?;
		Ok(envelope
			.rate_response
			.rates
			.into_iter()
			.map(|rate| RateQuote {
				carrier_id: rate.carrier_id,
				service_code: rate.service_code,
				amount: rate.shipping_amount.minor_units(),
				currency: rate.shipping_amount.currency,
				delivery_days: rate.delivery_days,
			})
			.collect())
	}

	async fn purchase_label(
		&self,
		carrier_id: &str,
		service_code: &str,
		params: &RateParams,
	) -> GatewayResult<ShippingLabel> {
		debug!("Purchasing label: {} / {}", carrier_id, service_code);

		let mut shipment = Self::shipment_json(params, Some(service_code));
		shipment["carrier_id"] = json!(carrier_id);
		let body = json!({"shipment": shipment, "label_format": "pdf"});

		let response = self
			.client()?
			.post(self.url("/v1/labels"))
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.json(&body)
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let raw: LabelObject = response.json().await.map_err(GatewayError::Http)?;
		Ok(ShippingLabel {
			label_id: raw.label_id,
			tracking_number: raw.tracking_number,
			label_url: raw.label_download.and_then(|d| d.pdf),
			carrier_id: raw.carrier_id,
			service_code: raw.service_code,
			amount: raw.shipment_cost.minor_units(),
			currency: raw.shipment_cost.currency,
		})
	}

	async fn track(
		&self,
		carrier_id: &str,
		tracking_number: &str,
	) -> GatewayResult<TrackingStatus> {
		let response = self
			.client()?
			.get(self.url("/v1/tracking"))
			.query(&[
				("carrier_code", carrier_id),
				("tracking_number", tracking_number),
			])
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;

		if !response.status().is_success() {
			return Err(Self::read_error(response).await);
		}

		let raw: TrackingObject = response.json().await.map_err(GatewayError::Http)?;
		Ok(TrackingStatus {
			tracking_number: raw.tracking_number,
			status_code: raw.status_code,
			description: raw.status_description.unwrap_or_default(),
			estimated_delivery: raw.estimated_delivery_date,
		})
	}

	async fn health_check(&self) -> GatewayResult<bool> {
		let response = self
			.client()?
			.get(self.url("/v1/carriers"))
			.timeout(Duration::from_millis(self.config.timeout_ms))
			.send()
			.await
			.map_err(|e| self.map_send_error(e))?;
		Ok(response.status().is_success())
	}

	fn name(&self) -> &str {
		VENDOR
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_money_conversion_to_minor_units() {
		let money = MoneyObject {
			amount: 8.95,
			currency: "usd".to_string(),
		};
		assert_eq!(money.minor_units(), 895);

		let money = MoneyObject {
			amount: 12.0,
			currency: "usd".to_string(),
		};
		assert_eq!(money.minor_units(), 1200);
	}

	#[test]
	fn test_address_wire_shape() {
		let address = Address {
			name: "Jo Smith".to_string(),
			line1: "1 Main St".to_string(),
			line2: None,
			city: "Portland".to_string(),
			state: Some("OR".to_string()),
			postal_code: "97201".to_string(),
			country: "US".to_string(),
		};
		let wire = ShipEngineGateway::address_json(&address);
		assert_eq!(wire["address_line1"], "1 Main St");
		assert_eq!(wire["city_locality"], "Portland");
		assert_eq!(wire["country_code"], "US");
	}
}
