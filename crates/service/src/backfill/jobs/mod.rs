//! Shipped backfill jobs

pub mod cart_items;
pub mod order_refs;
pub mod payment_meta;

pub use cart_items::CartItemsJob;
pub use order_refs::OrderRefsJob;
pub use payment_meta::PaymentMetaJob;
