pub mod checkout;
pub mod common;
pub mod health;
pub mod ops;
pub mod orders;
pub mod shipping;
pub mod webhooks;

pub use checkout::post_checkout;
pub use health::{health, ready};
pub use ops::post_drain_flush;
pub use orders::{get_order, get_orders};
pub use shipping::{get_tracking, post_labels, post_rates};
pub use webhooks::{post_content_webhook, post_identity_webhook, post_payment_webhook};
