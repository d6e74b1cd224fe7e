//! In-memory document store using DashMap with TTL support
//!
//! Documents are held as raw JSON, the way the content store holds them, so
//! historical shapes (legacy cart fields and all) can be seeded and rewritten
//! by the backfill jobs exactly as they would be in production. Typed
//! accessors round-trip through serde.

use crate::traits::{
	CustomerStorage, DocumentStore, InvoiceStorage, LogStorage, OrderStorage, ProductStorage,
	QuoteStorage, RawDocument, ShipmentStorage, StorageError, StorageResult, StorageStats,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use ops_types::storage::{Mutation, Page, PageRequest, Patch, Transaction};
use ops_types::{
	Customer, DocId, FunctionLog, Invoice, Order, OrderStatus, Product, Shipment, ShippingQuote,
	DRAFT_PREFIX,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// In-memory store for every document type, with quote TTL support
#[derive(Clone)]
pub struct MemoryStore {
	orders: Arc<DashMap<String, Value>>,
	products: Arc<DashMap<String, Value>>,
	customers: Arc<DashMap<String, Value>>,
	invoices: Arc<DashMap<String, Value>>,
	quotes: Arc<DashMap<String, Value>>,
	shipments: Arc<DashMap<String, Value>>,
	logs: Arc<DashMap<String, Value>>,
	/// Serializes transactions so a batch becomes visible all at once
	tx_lock: Arc<Mutex<()>>,
	pub quote_ttl_enabled: bool,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			orders: Arc::new(DashMap::new()),
			products: Arc::new(DashMap::new()),
			customers: Arc::new(DashMap::new()),
			invoices: Arc::new(DashMap::new()),
			quotes: Arc::new(DashMap::new()),
			shipments: Arc::new(DashMap::new()),
			logs: Arc::new(DashMap::new()),
			tx_lock: Arc::new(Mutex::new(())),
			quote_ttl_enabled: true,
		}
	}

	/// Create a store with quote TTL sweeping disabled (tests)
	pub fn with_ttl_enabled(ttl_enabled: bool) -> Self {
		Self {
			quote_ttl_enabled: ttl_enabled,
			..Self::new()
		}
	}

	/// Start the TTL cleanup task for expired shipping quotes
	pub fn start_ttl_cleanup(&self) -> tokio::task::JoinHandle<()> {
		if !self.quote_ttl_enabled {
			return tokio::spawn(async {});
		}

		let store = self.clone();
		tokio::spawn(async move {
			let mut cleanup_interval = interval(Duration::from_secs(60));

			loop {
				cleanup_interval.tick().await;
				match store.cleanup_expired_quotes().await {
					Ok(0) => {},
					Ok(n) => debug!("Cleaned up {} expired shipping quotes", n),
					Err(e) => warn!("Quote TTL sweep failed: {}", e),
				}
			}
		})
	}

	/// Seed a raw document directly, bypassing the typed API. Used by tests
	/// and fixtures to plant historical document shapes.
	pub fn seed_raw(&self, id: &DocId, body: Value) {
		self.map_for_prefix(id).insert(id.to_string(), body);
	}

	fn map_for_prefix(&self, id: &DocId) -> &DashMap<String, Value> {
		let published = id.published();
		let prefix = published.as_str().split('.').next().unwrap_or("");
		match prefix {
			"product" => &self.products,
			"customer" => &self.customers,
			"invoice" => &self.invoices,
			"quote" => &self.quotes,
			"shipment" => &self.shipments,
			"log" => &self.logs,
			// Orders are the default home: legacy ids did not always carry
			// a type prefix.
			_ => &self.orders,
		}
	}

	/// Locate the map currently holding a document id
	fn map_holding(&self, id: &str) -> Option<&DashMap<String, Value>> {
		[
			&self.orders,
			&self.products,
			&self.customers,
			&self.invoices,
			&self.quotes,
			&self.shipments,
			&self.logs,
		]
		.into_iter()
		.find(|m| m.contains_key(id))
		.map(|m| &**m)
	}

	fn insert_typed<T: Serialize>(
		map: &DashMap<String, Value>,
		id: &DocId,
		doc: &T,
	) -> StorageResult<()> {
		let mut body = serde_json::to_value(doc).map_err(|e| StorageError::Serialization {
			message: e.to_string(),
		})?;
		if let Some(obj) = body.as_object_mut() {
			obj.insert("rev".to_string(), Value::String(Uuid::new_v4().to_string()));
		}
		map.insert(id.to_string(), body);
		Ok(())
	}

	fn get_typed<T: DeserializeOwned>(
		map: &DashMap<String, Value>,
		id: &str,
	) -> StorageResult<Option<T>> {
		match map.get(id) {
			Some(entry) => serde_json::from_value(entry.value().clone())
				.map(Some)
				.map_err(|e| StorageError::Serialization {
					message: format!("document {}: {}", id, e),
				}),
			None => Ok(None),
		}
	}

	/// One id-ordered page of raw documents, drafts excluded
	fn page_raw(map: &DashMap<String, Value>, page: &PageRequest) -> Page<RawDocument> {
		let limit = page.effective_limit();
		let mut ids: Vec<String> = map
			.iter()
			.map(|e| e.key().clone())
			.filter(|id| !id.starts_with(DRAFT_PREFIX))
			.collect();
		ids.sort();

		let items: Vec<RawDocument> = ids
			.into_iter()
			.filter(|id| match &page.after {
				Some(cursor) => id.as_str() > cursor.as_str(),
				None => true,
			})
			.take(limit)
			.filter_map(|id| {
				map.get(&id).map(|entry| RawDocument {
					id: DocId::new(id.clone()),
					body: entry.value().clone(),
				})
			})
			.collect();

		let next_cursor = if items.len() == limit {
			items.last().map(|d| d.id.to_string())
		} else {
			None
		};

		Page { items, next_cursor }
	}

	/// Typed page over a raw map; documents that no longer deserialize
	/// (pre-backfill shapes) are skipped with a warning.
	fn page_typed<T: DeserializeOwned>(
		map: &DashMap<String, Value>,
		page: &PageRequest,
	) -> Page<T> {
		let raw = Self::page_raw(map, page);
		let next_cursor = raw.next_cursor.clone();
		let items = raw
			.items
			.into_iter()
			.filter_map(|doc| match serde_json::from_value(doc.body) {
				Ok(typed) => Some(typed),
				Err(e) => {
					warn!("Skipping non-canonical document {}: {}", doc.id, e);
					None
				},
			})
			.collect();
		Page { items, next_cursor }
	}

	fn collect_typed<T: DeserializeOwned>(
		map: &DashMap<String, Value>,
		mut keep: impl FnMut(&T) -> bool,
	) -> Vec<T> {
		let mut out: Vec<(String, T)> = map
			.iter()
			.filter(|e| !e.key().starts_with(DRAFT_PREFIX))
			.filter_map(|e| {
				serde_json::from_value::<T>(e.value().clone())
					.ok()
					.filter(|t| keep(t))
					.map(|t| (e.key().clone(), t))
			})
			.collect();
		out.sort_by(|a, b| a.0.cmp(&b.0));
		out.into_iter().map(|(_, t)| t).collect()
	}

	fn apply_patch(&self, patch: &Patch) -> StorageResult<()> {
		let id = patch.id.to_string();
		let map = self
			.map_holding(&id)
			.ok_or_else(|| StorageError::NotFound { id: id.clone() })?;
		let mut entry = map
			.get_mut(&id)
			.ok_or_else(|| StorageError::NotFound { id: id.clone() })?;

		if let Some(expected) = &patch.if_revision {
			let current = entry.value().get("rev").and_then(Value::as_str);
			if current != Some(expected.as_str()) {
				return Err(StorageError::Conflict {
					id,
					expected: expected.clone(),
				});
			}
		}

		patch.apply_to(entry.value_mut());
		if let Some(obj) = entry.value_mut().as_object_mut() {
			obj.insert("rev".to_string(), Value::String(Uuid::new_v4().to_string()));
		}
		Ok(())
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

// Trait implementations for pluggable storage

#[async_trait]
impl OrderStorage for MemoryStore {
	async fn create_order(&self, order: Order) -> StorageResult<()> {
		Self::insert_typed(&self.orders, &order.id.clone(), &order)
	}

	async fn get_order(&self, order_id: &DocId) -> StorageResult<Option<Order>> {
		Self::get_typed(&self.orders, order_id.as_str())
	}

	async fn update_order(&self, order: Order) -> StorageResult<()> {
		Self::insert_typed(&self.orders, &order.id.clone(), &order)
	}

	async fn get_order_by_intent(&self, intent_id: &str) -> StorageResult<Option<Order>> {
		for entry in self.orders.iter() {
			let matches = entry
				.value()
				.pointer("/payment/intent_id")
				.and_then(Value::as_str)
				== Some(intent_id);
			if matches {
				return Self::get_typed(&self.orders, entry.key());
			}
		}
		Ok(None)
	}

	async fn get_orders_by_customer(&self, customer_id: &DocId) -> StorageResult<Vec<Order>> {
		Ok(Self::collect_typed(&self.orders, |o: &Order| {
			o.customer.as_ref() == Some(customer_id)
		}))
	}

	async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
		Ok(Self::collect_typed(&self.orders, |o: &Order| {
			o.status == status
		}))
	}

	async fn list_orders(&self, page: &PageRequest) -> StorageResult<Page<Order>> {
		Ok(Self::page_typed(&self.orders, page))
	}

	async fn list_raw_orders(&self, page: &PageRequest) -> StorageResult<Page<RawDocument>> {
		Ok(Self::page_raw(&self.orders, page))
	}

	async fn remove_order(&self, order_id: &DocId) -> StorageResult<bool> {
		Ok(self.orders.remove(order_id.as_str()).is_some())
	}

	async fn order_count(&self) -> StorageResult<usize> {
		Ok(self.orders.len())
	}
}

#[async_trait]
impl ProductStorage for MemoryStore {
	async fn create_product(&self, product: Product) -> StorageResult<()> {
		Self::insert_typed(&self.products, &product.id.clone(), &product)
	}

	async fn get_product(&self, product_id: &DocId) -> StorageResult<Option<Product>> {
		Self::get_typed(&self.products, product_id.as_str())
	}

	async fn get_product_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
		let matches = Self::collect_typed(&self.products, |p: &Product| p.sku == sku);
		Ok(matches.into_iter().next())
	}

	async fn update_product(&self, product: Product) -> StorageResult<()> {
		Self::insert_typed(&self.products, &product.id.clone(), &product)
	}

	async fn list_products(&self, page: &PageRequest) -> StorageResult<Page<Product>> {
		Ok(Self::page_typed(&self.products, page))
	}

	async fn remove_product(&self, product_id: &DocId) -> StorageResult<bool> {
		Ok(self.products.remove(product_id.as_str()).is_some())
	}

	async fn product_count(&self) -> StorageResult<usize> {
		Ok(self.products.len())
	}
}

#[async_trait]
impl CustomerStorage for MemoryStore {
	async fn create_customer(&self, customer: Customer) -> StorageResult<()> {
		Self::insert_typed(&self.customers, &customer.id.clone(), &customer)
	}

	async fn get_customer(&self, customer_id: &DocId) -> StorageResult<Option<Customer>> {
		Self::get_typed(&self.customers, customer_id.as_str())
	}

	async fn get_customer_by_email(&self, email: &str) -> StorageResult<Option<Customer>> {
		let matches = Self::collect_typed(&self.customers, |c: &Customer| c.email == email);
		Ok(matches.into_iter().next())
	}

	async fn get_customer_by_subject(&self, subject: &str) -> StorageResult<Option<Customer>> {
		let matches = Self::collect_typed(&self.customers, |c: &Customer| {
			c.subject.as_deref() == Some(subject)
		});
		Ok(matches.into_iter().next())
	}

	async fn update_customer(&self, customer: Customer) -> StorageResult<()> {
		Self::insert_typed(&self.customers, &customer.id.clone(), &customer)
	}

	async fn customer_count(&self) -> StorageResult<usize> {
		Ok(self.customers.len())
	}
}

#[async_trait]
impl InvoiceStorage for MemoryStore {
	async fn create_invoice(&self, invoice: Invoice) -> StorageResult<()> {
		Self::insert_typed(&self.invoices, &invoice.id.clone(), &invoice)
	}

	async fn get_invoice(&self, invoice_id: &DocId) -> StorageResult<Option<Invoice>> {
		Self::get_typed(&self.invoices, invoice_id.as_str())
	}

	async fn get_invoice_by_order(&self, order_id: &DocId) -> StorageResult<Option<Invoice>> {
		let matches = Self::collect_typed(&self.invoices, |i: &Invoice| i.order == *order_id);
		Ok(matches.into_iter().next())
	}

	async fn invoice_count(&self) -> StorageResult<usize> {
		Ok(self.invoices.len())
	}
}

#[async_trait]
impl QuoteStorage for MemoryStore {
	async fn add_quote(&self, quote: ShippingQuote) -> StorageResult<()> {
		Self::insert_typed(&self.quotes, &quote.id.clone(), &quote)
	}

	async fn get_quote(&self, quote_id: &DocId) -> StorageResult<Option<ShippingQuote>> {
		Self::get_typed(&self.quotes, quote_id.as_str())
	}

	async fn get_quotes_for_order(&self, order_id: &DocId) -> StorageResult<Vec<ShippingQuote>> {
		let ttl = self.quote_ttl_enabled;
		Ok(Self::collect_typed(&self.quotes, |q: &ShippingQuote| {
			q.order == *order_id && (!ttl || !q.is_expired())
		}))
	}

	async fn remove_quotes_for_order(&self, order_id: &DocId) -> StorageResult<usize> {
		let mut removed = 0;
		self.quotes.retain(|_, body| {
			let belongs = body.get("order").and_then(Value::as_str) == Some(order_id.as_str());
			if belongs {
				removed += 1;
			}
			!belongs
		});
		Ok(removed)
	}

	async fn cleanup_expired_quotes(&self) -> StorageResult<usize> {
		if !self.quote_ttl_enabled {
			return Ok(0);
		}

		let now = Utc::now();
		let mut removed_count = 0;

		self.quotes.retain(|key, body| {
			let expired = body
				.get("expires_at")
				.and_then(Value::as_str)
				.and_then(|s| s.parse::<chrono::DateTime<Utc>>().ok())
				.is_some_and(|at| at <= now);
			if expired {
				removed_count += 1;
				debug!("Removed expired shipping quote: {}", key);
			}
			!expired
		});

		if removed_count > 0 {
			info!("Cleaned up {} expired shipping quotes", removed_count);
		}

		Ok(removed_count)
	}

	async fn quote_stats(&self) -> StorageResult<(usize, usize)> {
		let total = self.quotes.len();
		let active = if self.quote_ttl_enabled {
			Self::collect_typed(&self.quotes, |q: &ShippingQuote| !q.is_expired()).len()
		} else {
			total
		};
		Ok((total, active))
	}
}

#[async_trait]
impl ShipmentStorage for MemoryStore {
	async fn create_shipment(&self, shipment: Shipment) -> StorageResult<()> {
		Self::insert_typed(&self.shipments, &shipment.id.clone(), &shipment)
	}

	async fn get_shipment(&self, shipment_id: &DocId) -> StorageResult<Option<Shipment>> {
		Self::get_typed(&self.shipments, shipment_id.as_str())
	}

	async fn get_shipment_by_order(&self, order_id: &DocId) -> StorageResult<Option<Shipment>> {
		let matches = Self::collect_typed(&self.shipments, |s: &Shipment| s.order == *order_id);
		Ok(matches.into_iter().next())
	}

	async fn update_shipment(&self, shipment: Shipment) -> StorageResult<()> {
		Self::insert_typed(&self.shipments, &shipment.id.clone(), &shipment)
	}

	async fn shipment_count(&self) -> StorageResult<usize> {
		Ok(self.shipments.len())
	}
}

#[async_trait]
impl LogStorage for MemoryStore {
	async fn append_log(&self, log: FunctionLog) -> StorageResult<()> {
		Self::insert_typed(&self.logs, &log.id.clone(), &log)
	}

	async fn list_undrained(&self, limit: usize) -> StorageResult<Vec<FunctionLog>> {
		let mut logs = Self::collect_typed(&self.logs, |l: &FunctionLog| !l.drained);
		logs.sort_by_key(|l| l.recorded_at);
		logs.truncate(limit);
		Ok(logs)
	}

	async fn mark_drained(&self, ids: &[DocId]) -> StorageResult<usize> {
		let mut marked = 0;
		for id in ids {
			if let Some(mut entry) = self.logs.get_mut(id.as_str()) {
				if let Some(obj) = entry.value_mut().as_object_mut() {
					obj.insert("drained".to_string(), Value::Bool(true));
					marked += 1;
				}
			}
		}
		Ok(marked)
	}

	async fn log_count(&self) -> StorageResult<usize> {
		Ok(self.logs.len())
	}
}

#[async_trait]
impl DocumentStore for MemoryStore {
	async fn apply(&self, transaction: Transaction) -> StorageResult<usize> {
		// All-or-nothing: validate every mutation against current state
		// before touching anything, under the transaction lock.
		let _guard = self.tx_lock.lock().await;

		for mutation in &transaction.mutations {
			match mutation {
				Mutation::Patch(patch) => {
					let id = patch.id.to_string();
					let map = self
						.map_holding(&id)
						.ok_or_else(|| StorageError::NotFound { id: id.clone() })?;
					if let Some(expected) = &patch.if_revision {
						let entry = map
							.get(&id)
							.ok_or_else(|| StorageError::NotFound { id: id.clone() })?;
						let current = entry.value().get("rev").and_then(Value::as_str);
						if current != Some(expected.as_str()) {
							return Err(StorageError::Conflict {
								id,
								expected: expected.clone(),
							});
						}
					}
				},
				Mutation::CreateIfMissing(doc) => {
					if doc.get("id").and_then(Value::as_str).is_none() {
						return Err(StorageError::Operation {
							message: "create_if_missing document has no id".to_string(),
						});
					}
				},
				Mutation::Delete(_) => {},
			}
		}

		let mut applied = 0;
		for mutation in &transaction.mutations {
			match mutation {
				Mutation::Patch(patch) => {
					self.apply_patch(patch)?;
					applied += 1;
				},
				Mutation::CreateIfMissing(doc) => {
					// Id presence validated above
					let id = doc.get("id").and_then(Value::as_str).unwrap_or_default();
					let doc_id = DocId::new(id);
					let map = self.map_for_prefix(&doc_id);
					if !map.contains_key(id) {
						map.insert(id.to_string(), doc.clone());
					}
					applied += 1;
				},
				Mutation::Delete(id) => {
					if let Some(map) = self.map_holding(id.as_str()) {
						map.remove(id.as_str());
					}
					applied += 1;
				},
			}
		}

		Ok(applied)
	}

	async fn health_check(&self) -> StorageResult<bool> {
		// For in-memory storage, just check that the maps are accessible
		Ok(true)
	}

	async fn stats(&self) -> StorageResult<StorageStats> {
		let (total_quotes, active_quotes) = self.quote_stats().await?;
		Ok(StorageStats {
			total_orders: self.orders.len(),
			total_products: self.products.len(),
			total_customers: self.customers.len(),
			total_shipments: self.shipments.len(),
			total_invoices: self.invoices.len(),
			total_quotes,
			active_quotes,
			pending_logs: self.list_undrained(usize::MAX).await?.len(),
		})
	}

	async fn close(&self) -> StorageResult<()> {
		// Nothing to close for the memory store
		Ok(())
	}

	async fn start_background_tasks(&self) -> StorageResult<()> {
		self.start_ttl_cleanup();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ops_types::LineItem;
	use serde_json::json;

	fn test_order(n: u32) -> Order {
		let mut order = Order::new(format!("SO-{}", 1000 + n), "usd".to_string());
		order.id = DocId::new(format!("order.{:04}", n));
		order.with_line_items(vec![LineItem {
			product: None,
			sku: "MUG-01".to_string(),
			title: "Mug".to_string(),
			quantity: 1,
			unit_price: 1250,
		}])
	}

	#[tokio::test]
	async fn test_order_round_trip() {
		let store = MemoryStore::new();
		let order = test_order(1);
		store.create_order(order.clone()).await.unwrap();

		let loaded = store.get_order(&order.id).await.unwrap().unwrap();
		assert_eq!(loaded.order_number, order.order_number);
	}

	#[tokio::test]
	async fn test_cursor_pagination_walks_all_orders() {
		let store = MemoryStore::new();
		for n in 0..7 {
			store.create_order(test_order(n)).await.unwrap();
		}

		let mut seen = Vec::new();
		let mut cursor: Option<String> = None;
		loop {
			let page = store
				.list_orders(&PageRequest {
					after: cursor.clone(),
					limit: Some(3),
				})
				.await
				.unwrap();
			seen.extend(page.items.iter().map(|o| o.id.to_string()));
			match page.next_cursor {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		assert_eq!(seen.len(), 7);
		let mut sorted = seen.clone();
		sorted.sort();
		assert_eq!(seen, sorted, "pages must be id-ordered");
	}

	#[tokio::test]
	async fn test_drafts_excluded_from_listings() {
		let store = MemoryStore::new();
		store.create_order(test_order(1)).await.unwrap();
		store.seed_raw(
			&DocId::new("drafts.order.0002"),
			json!({"id": "drafts.order.0002", "status": "pending"}),
		);

		let page = store
			.list_raw_orders(&PageRequest::default())
			.await
			.unwrap();
		assert_eq!(page.items.len(), 1);
	}

	#[tokio::test]
	async fn test_transaction_patch_and_revision_conflict() {
		let store = MemoryStore::new();
		let order = test_order(1);
		store.create_order(order.clone()).await.unwrap();

		let tx = Transaction::new().patch(
			Patch::new(order.id.clone()).set("status", json!("awaiting_payment")),
		);
		assert_eq!(store.apply(tx).await.unwrap(), 1);

		let loaded = store.get_order(&order.id).await.unwrap().unwrap();
		assert_eq!(loaded.status, OrderStatus::AwaitingPayment);

		// Stale revision is rejected before anything is applied
		let tx = Transaction::new().patch(
			Patch::new(order.id.clone())
				.set("status", json!("paid"))
				.if_revision("not-the-current-rev"),
		);
		assert!(matches!(
			store.apply(tx).await,
			Err(StorageError::Conflict { .. })
		));
		let loaded = store.get_order(&order.id).await.unwrap().unwrap();
		assert_eq!(loaded.status, OrderStatus::AwaitingPayment);
	}

	#[tokio::test]
	async fn test_expired_quotes_sweep_and_listing() {
		let store = MemoryStore::new();
		let order_id = DocId::new("order.0001");
		let quote = ShippingQuote::new(
			order_id.clone(),
			"usps".to_string(),
			"usps_priority".to_string(),
			895,
			"usd".to_string(),
		)
		.with_ttl(chrono::Duration::minutes(-5));
		let quote_id = quote.id.clone();
		store.add_quote(quote).await.unwrap();

		// Direct get still returns it (the service decides what expiry means)
		assert!(store.get_quote(&quote_id).await.unwrap().is_some());
		// Listings and the sweep treat it as gone
		assert!(store
			.get_quotes_for_order(&order_id)
			.await
			.unwrap()
			.is_empty());
		assert_eq!(store.cleanup_expired_quotes().await.unwrap(), 1);
		assert!(store.get_quote(&quote_id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_undrained_logs_and_marking() {
		let store = MemoryStore::new();
		let log = FunctionLog::new("checkout".to_string(), 200, 12);
		let id = log.id.clone();
		store.append_log(log).await.unwrap();

		assert_eq!(store.list_undrained(10).await.unwrap().len(), 1);
		assert_eq!(store.mark_drained(&[id]).await.unwrap(), 1);
		assert!(store.list_undrained(10).await.unwrap().is_empty());
	}
}
