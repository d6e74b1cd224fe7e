//! Ops Service
//!
//! Business operations for the commerce service: checkout, order lifecycle,
//! shipping, notifications, webhook signatures, log drains, and the order
//! backfill machinery.

pub mod backfill;
pub mod checkout;
pub mod drains;
pub mod notify;
pub mod order;
pub mod shipping;
pub mod signature;

pub use backfill::{
	job_by_name, standard_jobs, BackfillJob, BackfillOptions, BackfillReport, BackfillRunner,
	CartItemsJob, OrderRefsJob, PaymentMetaJob,
};
pub use checkout::{CheckoutError, CheckoutService};
pub use drains::{DrainError, DrainReport, DrainService, DrainTargetSpec, RequestLogService};
pub use notify::{NotifyError, NotifyService};
pub use order::{OrderService, OrderServiceError, PaymentApplication};
pub use shipping::{ShippingService, ShippingServiceError};
pub use signature::{SignatureError, SignatureService, SignatureTrait, DEFAULT_TOLERANCE_SECS};

#[cfg(test)]
pub use signature::MockSignatureTrait;
