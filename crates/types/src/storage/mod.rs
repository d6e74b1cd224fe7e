//! Storage traits and the document mutation model

pub mod errors;
pub mod page;
pub mod patch;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use patch::{Mutation, Patch, Transaction};
pub use traits::{
	CustomerStorage, DocumentStore, InvoiceStorage, LogStorage, OrderStorage, ProductStorage,
	QuoteStorage, RawDocument, ShipmentStorage, StorageStats,
};
