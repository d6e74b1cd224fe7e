//! Storage traits for pluggable document-store backends

use async_trait::async_trait;
use serde_json::Value;

use super::errors::StorageResult;
use super::page::{Page, PageRequest};
use super::patch::Transaction;
use crate::customers::Customer;
use crate::invoices::Invoice;
use crate::logs::FunctionLog;
use crate::models::DocId;
use crate::orders::{Order, OrderStatus};
use crate::products::Product;
use crate::shipping::{Shipment, ShippingQuote};

/// A raw document as stored, before any canonicalization
///
/// The backfill machinery works on these: historical documents may not
/// deserialize into the canonical structs at all.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
	pub id: DocId,
	pub body: Value,
}

/// Statistics about storage usage
#[derive(Debug, Clone)]
pub struct StorageStats {
	pub total_orders: usize,
	pub total_products: usize,
	pub total_customers: usize,
	pub total_shipments: usize,
	pub total_invoices: usize,
	pub total_quotes: usize,
	pub active_quotes: usize,
	pub pending_logs: usize,
}

/// Trait for order storage operations
#[async_trait]
pub trait OrderStorage: Send + Sync {
	/// Add a new order to storage
	async fn create_order(&self, order: Order) -> StorageResult<()>;

	/// Get an order by id
	async fn get_order(&self, order_id: &DocId) -> StorageResult<Option<Order>>;

	/// Update an existing order
	async fn update_order(&self, order: Order) -> StorageResult<()>;

	/// Find the order owning a payment intent
	async fn get_order_by_intent(&self, intent_id: &str) -> StorageResult<Option<Order>>;

	/// Orders for one customer, id-ordered
	async fn get_orders_by_customer(&self, customer_id: &DocId) -> StorageResult<Vec<Order>>;

	/// Orders with a specific status
	async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>>;

	/// One id-ordered page of orders
	async fn list_orders(&self, page: &PageRequest) -> StorageResult<Page<Order>>;

	/// One id-ordered page of raw order documents, canonical or not.
	/// Drafts are excluded; the backfills only rewrite published documents.
	async fn list_raw_orders(&self, page: &PageRequest) -> StorageResult<Page<RawDocument>>;

	/// Remove an order by id
	async fn remove_order(&self, order_id: &DocId) -> StorageResult<bool>;

	/// Get order count
	async fn order_count(&self) -> StorageResult<usize>;
}

/// Trait for product storage operations
#[async_trait]
pub trait ProductStorage: Send + Sync {
	async fn create_product(&self, product: Product) -> StorageResult<()>;

	async fn get_product(&self, product_id: &DocId) -> StorageResult<Option<Product>>;

	async fn get_product_by_sku(&self, sku: &str) -> StorageResult<Option<Product>>;

	async fn update_product(&self, product: Product) -> StorageResult<()>;

	async fn list_products(&self, page: &PageRequest) -> StorageResult<Page<Product>>;

	async fn remove_product(&self, product_id: &DocId) -> StorageResult<bool>;

	async fn product_count(&self) -> StorageResult<usize>;
}

/// Trait for customer storage operations
#[async_trait]
pub trait CustomerStorage: Send + Sync {
	async fn create_customer(&self, customer: Customer) -> StorageResult<()>;

	async fn get_customer(&self, customer_id: &DocId) -> StorageResult<Option<Customer>>;

	async fn get_customer_by_email(&self, email: &str) -> StorageResult<Option<Customer>>;

	async fn get_customer_by_subject(&self, subject: &str) -> StorageResult<Option<Customer>>;

	async fn update_customer(&self, customer: Customer) -> StorageResult<()>;

	async fn customer_count(&self) -> StorageResult<usize>;
}

/// Trait for invoice storage operations
#[async_trait]
pub trait InvoiceStorage: Send + Sync {
	async fn create_invoice(&self, invoice: Invoice) -> StorageResult<()>;

	async fn get_invoice(&self, invoice_id: &DocId) -> StorageResult<Option<Invoice>>;

	/// The invoice issued for an order, if any
	async fn get_invoice_by_order(&self, order_id: &DocId) -> StorageResult<Option<Invoice>>;

	async fn invoice_count(&self) -> StorageResult<usize>;
}

/// Trait for shipping-quote storage operations
#[async_trait]
pub trait QuoteStorage: Send + Sync {
	async fn add_quote(&self, quote: ShippingQuote) -> StorageResult<()>;

	/// Get a quote by id, expired or not; callers decide what expiry means
	async fn get_quote(&self, quote_id: &DocId) -> StorageResult<Option<ShippingQuote>>;

	/// All unexpired quotes stored for an order
	async fn get_quotes_for_order(&self, order_id: &DocId) -> StorageResult<Vec<ShippingQuote>>;

	/// Drop quotes for an order, e.g. after its contents changed
	async fn remove_quotes_for_order(&self, order_id: &DocId) -> StorageResult<usize>;

	/// Remove expired quotes
	async fn cleanup_expired_quotes(&self) -> StorageResult<usize>;

	/// (total, active) quote counts
	async fn quote_stats(&self) -> StorageResult<(usize, usize)>;
}

/// Trait for shipment storage operations
#[async_trait]
pub trait ShipmentStorage: Send + Sync {
	async fn create_shipment(&self, shipment: Shipment) -> StorageResult<()>;

	async fn get_shipment(&self, shipment_id: &DocId) -> StorageResult<Option<Shipment>>;

	async fn get_shipment_by_order(&self, order_id: &DocId) -> StorageResult<Option<Shipment>>;

	async fn update_shipment(&self, shipment: Shipment) -> StorageResult<()>;

	async fn shipment_count(&self) -> StorageResult<usize>;
}

/// Trait for function-log storage operations
#[async_trait]
pub trait LogStorage: Send + Sync {
	async fn append_log(&self, log: FunctionLog) -> StorageResult<()>;

	/// Logs not yet delivered to every drain, oldest first
	async fn list_undrained(&self, limit: usize) -> StorageResult<Vec<FunctionLog>>;

	/// Mark logs as drained after a delivery run
	async fn mark_drained(&self, ids: &[DocId]) -> StorageResult<usize>;

	async fn log_count(&self) -> StorageResult<usize>;
}

/// Main storage trait combining all document operations
#[async_trait]
pub trait DocumentStore:
	OrderStorage
	+ ProductStorage
	+ CustomerStorage
	+ InvoiceStorage
	+ QuoteStorage
	+ ShipmentStorage
	+ LogStorage
{
	/// Apply a transaction atomically; returns the number of mutations applied
	async fn apply(&self, transaction: Transaction) -> StorageResult<usize>;

	/// Health check for the storage backend
	async fn health_check(&self) -> StorageResult<bool>;

	/// Overall storage statistics
	async fn stats(&self) -> StorageResult<StorageStats>;

	/// Close the storage connection
	async fn close(&self) -> StorageResult<()>;

	/// Start background tasks owned by the backend (e.g. TTL sweeping).
	/// Default implementation does nothing.
	async fn start_background_tasks(&self) -> StorageResult<()> {
		Ok(())
	}
}
