//! Shared models used across entities

pub mod doc_id;
pub mod secret_string;

pub use doc_id::{DocId, DRAFT_PREFIX};
pub use secret_string::SecretString;
