//! HTTP-backed document store speaking the content store's data API
//!
//! Queries go to `POST {endpoint}/v{version}/data/query/{dataset}` with a
//! filter expression; mutations go to `POST {endpoint}/v{version}/data/mutate/{dataset}`
//! as a transaction payload. Both are bearer-authenticated JSON. Consistency
//! is whatever the store's own transaction primitive provides; this client
//! only translates the trait calls onto the wire.

use crate::traits::{
	CustomerStorage, DocumentStore, InvoiceStorage, LogStorage, OrderStorage, ProductStorage,
	QuoteStorage, RawDocument, ShipmentStorage, StorageError, StorageResult, StorageStats,
};
use async_trait::async_trait;
use ops_types::storage::{Mutation, Page, PageRequest, Transaction};
use ops_types::{
	Customer, DocId, FunctionLog, Invoice, Order, OrderStatus, Product, SecretString, Shipment,
	ShippingQuote,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Configuration for the content-store data API
#[derive(Debug, Clone)]
pub struct ContentApiConfig {
	/// Base endpoint, e.g. `https://content.example.com`
	pub endpoint: String,
	pub dataset: String,
	/// Data API version date, e.g. `2024-01-01`
	pub api_version: String,
	pub token: SecretString,
	pub request_timeout_ms: u64,
}

/// Document store backed by the content store's HTTP data API
#[derive(Clone)]
pub struct ContentApiStore {
	config: ContentApiConfig,
	client: reqwest::Client,
}

/// Wire shape of a query response
#[derive(Debug, serde::Deserialize)]
struct QueryResult {
	documents: Vec<Value>,
	#[serde(default)]
	next_cursor: Option<String>,
}

/// Wire shape of a mutate response
#[derive(Debug, serde::Deserialize)]
struct MutateResult {
	results: Vec<Value>,
}

impl ContentApiStore {
	pub fn new(config: ContentApiConfig) -> StorageResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(std::time::Duration::from_millis(config.request_timeout_ms))
			.build()
			.map_err(|e| StorageError::Connection {
				message: e.to_string(),
			})?;
		Ok(Self { config, client })
	}

	fn url(&self, action: &str) -> String {
		format!(
			"{}/v{}/data/{}/{}",
			self.config.endpoint.trim_end_matches('/'),
			self.config.api_version,
			action,
			self.config.dataset
		)
	}

	async fn post(&self, url: &str, body: &Value) -> StorageResult<Value> {
		let response = self
			.client
			.post(url)
			.bearer_auth(self.config.token.expose_secret())
			.json(body)
			.send()
			.await
			.map_err(|e| StorageError::Connection {
				message: e.to_string(),
			})?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(StorageError::Backend {
				message: format!("{}: {}", status, message),
			});
		}

		response.json().await.map_err(|e| StorageError::Serialization {
			message: e.to_string(),
		})
	}

	/// Run a filtered, id-ordered query. `filter` is a store-side filter
	/// expression; `params` bind `$`-placeholders inside it.
	async fn query(
		&self,
		filter: &str,
		params: Value,
		after: Option<&str>,
		limit: Option<usize>,
	) -> StorageResult<QueryResult> {
		let body = json!({
			"filter": filter,
			"params": params,
			"order": "id asc",
			"after": after,
			"limit": limit,
			"exclude_drafts": true,
		});
		debug!("content-api query: {}", filter);
		let raw = self.post(&self.url("query"), &body).await?;
		serde_json::from_value(raw).map_err(|e| StorageError::Serialization {
			message: e.to_string(),
		})
	}

	async fn query_typed<T: DeserializeOwned>(
		&self,
		filter: &str,
		params: Value,
	) -> StorageResult<Vec<T>> {
		let result = self.query(filter, params, None, None).await?;
		result
			.documents
			.into_iter()
			.map(|doc| {
				serde_json::from_value(doc).map_err(|e| StorageError::Serialization {
					message: e.to_string(),
				})
			})
			.collect()
	}

	async fn get_by_id<T: DeserializeOwned>(&self, id: &DocId) -> StorageResult<Option<T>> {
		let mut docs: Vec<T> = self
			.query_typed("id == $id", json!({"id": id.as_str()}))
			.await?;
		Ok(if docs.is_empty() {
			None
		} else {
			Some(docs.swap_remove(0))
		})
	}

	async fn first_typed<T: DeserializeOwned>(
		&self,
		filter: &str,
		params: Value,
	) -> StorageResult<Option<T>> {
		let mut docs: Vec<T> = self.query_typed(filter, params).await?;
		Ok(if docs.is_empty() {
			None
		} else {
			Some(docs.swap_remove(0))
		})
	}

	async fn page_typed<T: DeserializeOwned>(
		&self,
		filter: &str,
		params: Value,
		page: &PageRequest,
	) -> StorageResult<Page<T>> {
		let result = self
			.query(
				filter,
				params,
				page.after.as_deref(),
				Some(page.effective_limit()),
			)
			.await?;
		let items = result
			.documents
			.into_iter()
			.map(|doc| {
				serde_json::from_value(doc).map_err(|e| StorageError::Serialization {
					message: e.to_string(),
				})
			})
			.collect::<StorageResult<Vec<T>>>()?;
		Ok(Page {
			items,
			next_cursor: result.next_cursor,
		})
	}

	async fn count(&self, filter: &str, params: Value) -> StorageResult<usize> {
		let result = self.query(filter, params, None, None).await?;
		Ok(result.documents.len())
	}

	async fn upsert<T: Serialize>(&self, doc: &T) -> StorageResult<()> {
		let mut body = serde_json::to_value(doc).map_err(|e| StorageError::Serialization {
			message: e.to_string(),
		})?;
		if let Some(obj) = body.as_object_mut() {
			// The store assigns revisions; never send a stale one back.
			obj.remove("rev");
		}
		let mutations = json!({
			"mutations": [{"create_or_replace": body}]
		});
		self.post(&self.url("mutate"), &mutations).await?;
		Ok(())
	}

	async fn delete(&self, id: &DocId) -> StorageResult<bool> {
		let mutations = json!({
			"mutations": [{"delete": {"id": id.as_str()}}]
		});
		let raw = self.post(&self.url("mutate"), &mutations).await?;
		let result: MutateResult =
			serde_json::from_value(raw).map_err(|e| StorageError::Serialization {
				message: e.to_string(),
			})?;
		Ok(!result.results.is_empty())
	}
}

#[async_trait]
impl OrderStorage for ContentApiStore {
	async fn create_order(&self, order: Order) -> StorageResult<()> {
		self.upsert(&order).await
	}

	async fn get_order(&self, order_id: &DocId) -> StorageResult<Option<Order>> {
		self.get_by_id(order_id).await
	}

	async fn update_order(&self, order: Order) -> StorageResult<()> {
		self.upsert(&order).await
	}

	async fn get_order_by_intent(&self, intent_id: &str) -> StorageResult<Option<Order>> {
		self.first_typed(
			"id match \"order.*\" && payment.intent_id == $intent",
			json!({"intent": intent_id}),
		)
		.await
	}

	async fn get_orders_by_customer(&self, customer_id: &DocId) -> StorageResult<Vec<Order>> {
		self.query_typed(
			"id match \"order.*\" && customer == $customer",
			json!({"customer": customer_id.as_str()}),
		)
		.await
	}

	async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
		self.query_typed(
			"id match \"order.*\" && status == $status",
			json!({"status": status}),
		)
		.await
	}

	async fn list_orders(&self, page: &PageRequest) -> StorageResult<Page<Order>> {
		self.page_typed("id match \"order.*\"", json!({}), page).await
	}

	async fn list_raw_orders(&self, page: &PageRequest) -> StorageResult<Page<RawDocument>> {
		let result = self
			.query(
				"id match \"order.*\"",
				json!({}),
				page.after.as_deref(),
				Some(page.effective_limit()),
			)
			.await?;
		let items = result
			.documents
			.into_iter()
			.filter_map(|body| {
				let id = body.get("id").and_then(Value::as_str)?.to_string();
				Some(RawDocument {
					id: DocId::new(id),
					body,
				})
			})
			.collect();
		Ok(Page {
			items,
			next_cursor: result.next_cursor,
		})
	}

	async fn remove_order(&self, order_id: &DocId) -> StorageResult<bool> {
		self.delete(order_id).await
	}

	async fn order_count(&self) -> StorageResult<usize> {
		self.count("id match \"order.*\"", json!({})).await
	}
}

#[async_trait]
impl ProductStorage for ContentApiStore {
	async fn create_product(&self, product: Product) -> StorageResult<()> {
		self.upsert(&product).await
	}

	async fn get_product(&self, product_id: &DocId) -> StorageResult<Option<Product>> {
		self.get_by_id(product_id).await
	}

	async fn get_product_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
		self.first_typed("id match \"product.*\" && sku == $sku", json!({"sku": sku}))
			.await
	}

	async fn update_product(&self, product: Product) -> StorageResult<()> {
		self.upsert(&product).await
	}

	async fn list_products(&self, page: &PageRequest) -> StorageResult<Page<Product>> {
		self.page_typed("id match \"product.*\"", json!({}), page)
			.await
	}

	async fn remove_product(&self, product_id: &DocId) -> StorageResult<bool> {
		self.delete(product_id).await
	}

	async fn product_count(&self) -> StorageResult<usize> {
		self.count("id match \"product.*\"", json!({})).await
	}
}

#[async_trait]
impl CustomerStorage for ContentApiStore {
	async fn create_customer(&self, customer: Customer) -> StorageResult<()> {
		self.upsert(&customer).await
	}

	async fn get_customer(&self, customer_id: &DocId) -> StorageResult<Option<Customer>> {
		self.get_by_id(customer_id).await
	}

	async fn get_customer_by_email(&self, email: &str) -> StorageResult<Option<Customer>> {
		self.first_typed(
			"id match \"customer.*\" && email == $email",
			json!({"email": email}),
		)
		.await
	}

	async fn get_customer_by_subject(&self, subject: &str) -> StorageResult<Option<Customer>> {
		self.first_typed(
			"id match \"customer.*\" && subject == $subject",
			json!({"subject": subject}),
		)
		.await
	}

	async fn update_customer(&self, customer: Customer) -> StorageResult<()> {
		self.upsert(&customer).await
	}

	async fn customer_count(&self) -> StorageResult<usize> {
		self.count("id match \"customer.*\"", json!({})).await
	}
}

#[async_trait]
impl InvoiceStorage for ContentApiStore {
	async fn create_invoice(&self, invoice: Invoice) -> StorageResult<()> {
		self.upsert(&invoice).await
	}

	async fn get_invoice(&self, invoice_id: &DocId) -> StorageResult<Option<Invoice>> {
		self.get_by_id(invoice_id).await
	}

	async fn get_invoice_by_order(&self, order_id: &DocId) -> StorageResult<Option<Invoice>> {
		self.first_typed(
			"id match \"invoice.*\" && order == $order",
			json!({"order": order_id.as_str()}),
		)
		.await
	}

	async fn invoice_count(&self) -> StorageResult<usize> {
		self.count("id match \"invoice.*\"", json!({})).await
	}
}

#[async_trait]
impl QuoteStorage for ContentApiStore {
	async fn add_quote(&self, quote: ShippingQuote) -> StorageResult<()> {
		self.upsert(&quote).await
	}

	async fn get_quote(&self, quote_id: &DocId) -> StorageResult<Option<ShippingQuote>> {
		self.get_by_id(quote_id).await
	}

	async fn get_quotes_for_order(&self, order_id: &DocId) -> StorageResult<Vec<ShippingQuote>> {
		let quotes: Vec<ShippingQuote> = self
			.query_typed(
				"id match \"quote.*\" && order == $order",
				json!({"order": order_id.as_str()}),
			)
			.await?;
		Ok(quotes.into_iter().filter(|q| !q.is_expired()).collect())
	}

	async fn remove_quotes_for_order(&self, order_id: &DocId) -> StorageResult<usize> {
		let quotes: Vec<ShippingQuote> = self
			.query_typed(
				"id match \"quote.*\" && order == $order",
				json!({"order": order_id.as_str()}),
			)
			.await?;
		let count = quotes.len();
		for quote in quotes {
			self.delete(&quote.id).await?;
		}
		Ok(count)
	}

	async fn cleanup_expired_quotes(&self) -> StorageResult<usize> {
		// Expiry filtering happens on read; actual deletion is left to the
		// store's own TTL tooling.
		Ok(0)
	}

	async fn quote_stats(&self) -> StorageResult<(usize, usize)> {
		let all: Vec<ShippingQuote> = self.query_typed("id match \"quote.*\"", json!({})).await?;
		let active = all.iter().filter(|q| !q.is_expired()).count();
		Ok((all.len(), active))
	}
}

#[async_trait]
impl ShipmentStorage for ContentApiStore {
	async fn create_shipment(&self, shipment: Shipment) -> StorageResult<()> {
		self.upsert(&shipment).await
	}

	async fn get_shipment(&self, shipment_id: &DocId) -> StorageResult<Option<Shipment>> {
		self.get_by_id(shipment_id).await
	}

	async fn get_shipment_by_order(&self, order_id: &DocId) -> StorageResult<Option<Shipment>> {
		self.first_typed(
			"id match \"shipment.*\" && order == $order",
			json!({"order": order_id.as_str()}),
		)
		.await
	}

	async fn update_shipment(&self, shipment: Shipment) -> StorageResult<()> {
		self.upsert(&shipment).await
	}

	async fn shipment_count(&self) -> StorageResult<usize> {
		self.count("id match \"shipment.*\"", json!({})).await
	}
}

#[async_trait]
impl LogStorage for ContentApiStore {
	async fn append_log(&self, log: FunctionLog) -> StorageResult<()> {
		self.upsert(&log).await
	}

	async fn list_undrained(&self, limit: usize) -> StorageResult<Vec<FunctionLog>> {
		let result = self
			.query(
				"id match \"log.*\" && drained != true",
				json!({}),
				None,
				Some(limit),
			)
			.await?;
		result
			.documents
			.into_iter()
			.map(|doc| {
				serde_json::from_value(doc).map_err(|e| StorageError::Serialization {
					message: e.to_string(),
				})
			})
			.collect()
	}

	async fn mark_drained(&self, ids: &[DocId]) -> StorageResult<usize> {
		if ids.is_empty() {
			return Ok(0);
		}
		let mutations: Vec<Value> = ids
			.iter()
			.map(|id| {
				json!({"patch": {"id": id.as_str(), "set": {"drained": true}}})
			})
			.collect();
		self.post(&self.url("mutate"), &json!({"mutations": mutations}))
			.await?;
		Ok(ids.len())
	}

	async fn log_count(&self) -> StorageResult<usize> {
		self.count("id match \"log.*\"", json!({})).await
	}
}

#[async_trait]
impl DocumentStore for ContentApiStore {
	async fn apply(&self, transaction: Transaction) -> StorageResult<usize> {
		if transaction.is_empty() {
			return Ok(0);
		}
		let mutations: Vec<Value> = transaction
			.mutations
			.iter()
			.map(|m| match m {
				Mutation::CreateIfMissing(doc) => json!({"create_if_missing": doc}),
				Mutation::Patch(patch) => json!({"patch": patch}),
				Mutation::Delete(id) => json!({"delete": {"id": id.as_str()}}),
			})
			.collect();
		let count = mutations.len();
		self.post(&self.url("mutate"), &json!({"mutations": mutations}))
			.await?;
		Ok(count)
	}

	async fn health_check(&self) -> StorageResult<bool> {
		let url = format!(
			"{}/v{}/ping",
			self.config.endpoint.trim_end_matches('/'),
			self.config.api_version
		);
		let response = self
			.client
			.get(&url)
			.bearer_auth(self.config.token.expose_secret())
			.send()
			.await
			.map_err(|e| StorageError::Connection {
				message: e.to_string(),
			})?;
		Ok(response.status().is_success())
	}

	async fn stats(&self) -> StorageResult<StorageStats> {
		let (total_quotes, active_quotes) = self.quote_stats().await?;
		Ok(StorageStats {
			total_orders: self.order_count().await?,
			total_products: self.product_count().await?,
			total_customers: self.customer_count().await?,
			total_shipments: self.shipment_count().await?,
			total_invoices: self.invoice_count().await?,
			total_quotes,
			active_quotes,
			pending_logs: self.list_undrained(usize::MAX).await?.len(),
		})
	}

	async fn close(&self) -> StorageResult<()> {
		// reqwest pools close on drop
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_config() -> ContentApiConfig {
		ContentApiConfig {
			endpoint: "https://content.example.com/".to_string(),
			dataset: "production".to_string(),
			api_version: "2024-01-01".to_string(),
			token: SecretString::from_str("sk-test"),
			request_timeout_ms: 5000,
		}
	}

	#[test]
	fn test_url_building_strips_trailing_slash() {
		let store = ContentApiStore::new(test_config()).unwrap();
		assert_eq!(
			store.url("query"),
			"https://content.example.com/v2024-01-01/data/query/production"
		);
		assert_eq!(
			store.url("mutate"),
			"https://content.example.com/v2024-01-01/data/mutate/production"
		);
	}
}
