//! Storage error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Document not found: {id}")]
	NotFound { id: String },
	#[error("Connection error: {message}")]
	Connection { message: String },
	#[error("Serialization error: {message}")]
	Serialization { message: String },
	#[error("Revision conflict on {id}: expected {expected}")]
	Conflict { id: String, expected: String },
	#[error("Backend rejected the operation: {message}")]
	Backend { message: String },
	#[error("Storage operation failed: {message}")]
	Operation { message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
