//! Storage traits for pluggable storage implementations

// Re-export the storage traits from the types crate
pub use ops_types::storage::{
	CustomerStorage, DocumentStore, InvoiceStorage, LogStorage, OrderStorage, ProductStorage,
	QuoteStorage, RawDocument, ShipmentStorage, StorageError, StorageResult, StorageStats,
};
