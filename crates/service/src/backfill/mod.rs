//! Order backfill machinery
//!
//! Historical order documents were written by several generations of the
//! storefront and carry incompatible shapes. Each backfill job pages through
//! the raw order documents, plans a patch for the ones that need rewriting,
//! and the runner applies each page's patches as one transaction. Jobs are
//! idempotent: a second run over already-canonical data plans nothing.

use async_trait::async_trait;
use ops_storage::DocumentStore;
use ops_types::storage::{Patch, RawDocument, StorageResult};

pub mod jobs;
pub mod runner;

pub use jobs::{CartItemsJob, OrderRefsJob, PaymentMetaJob};
pub use runner::{BackfillOptions, BackfillReport, BackfillRunner};

/// One idempotent migration over the raw order documents
#[async_trait]
pub trait BackfillJob: Send + Sync {
	/// Stable job name, used by the CLI and in reports
	fn name(&self) -> &'static str;

	/// One-line description of what the job rewrites
	fn description(&self) -> &'static str;

	/// Inspect one raw document and plan its patch.
	///
	/// Returns None (or an empty patch) for documents that are already
	/// canonical; that is what makes a job safe to re-run. Storage access
	/// is read-only here; all writes go through the runner's transaction.
	async fn plan(
		&self,
		storage: &dyn DocumentStore,
		doc: &RawDocument,
	) -> StorageResult<Option<Patch>>;
}

/// The jobs shipped with the service, in the order they should run
pub fn standard_jobs() -> Vec<Box<dyn BackfillJob>> {
	vec![
		Box::new(CartItemsJob),
		Box::new(OrderRefsJob),
		Box::new(PaymentMetaJob),
	]
}

/// Look up a shipped job by name
pub fn job_by_name(name: &str) -> Option<Box<dyn BackfillJob>> {
	standard_jobs().into_iter().find(|job| job.name() == name)
}
