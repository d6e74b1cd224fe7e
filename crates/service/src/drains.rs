//! Log-drain delivery
//!
//! Ships batches of function logs to every configured webhook target
//! concurrently. Targets succeed or fail independently; one bad drain never
//! blocks the others, and the whole fan-out runs under a global timeout.
//! Logs are only marked drained once every target accepted the batch, so a
//! failed target sees the same logs again on the next flush.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use ops_storage::traits::{DocumentStore, LogStorage};
use ops_types::{DocId, DrainOutcome, FunctionLog, SecretString};
use serde_json::json;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default batch size per flush
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum DrainError {
	#[error("storage error: {0}")]
	Storage(String),
}

/// One configured drain target
#[derive(Debug, Clone)]
pub struct DrainTargetSpec {
	pub name: String,
	pub endpoint: String,
	pub token: Option<SecretString>,
}

/// Result of one flush run
#[derive(Debug, Clone)]
pub struct DrainReport {
	pub batch_size: usize,
	pub outcomes: Vec<DrainOutcome>,
	/// Whether the batch was marked drained (every target succeeded)
	pub marked: bool,
}

#[derive(Clone)]
pub struct DrainService {
	storage: Arc<dyn DocumentStore>,
	targets: Vec<DrainTargetSpec>,
	client: reqwest::Client,
	global_timeout_ms: u64,
}

impl DrainService {
	pub fn new(
		storage: Arc<dyn DocumentStore>,
		targets: Vec<DrainTargetSpec>,
		global_timeout_ms: u64,
	) -> Self {
		Self {
			storage,
			targets,
			client: reqwest::Client::new(),
			global_timeout_ms,
		}
	}

	pub fn target_count(&self) -> usize {
		self.targets.len()
	}

	/// Deliver the next batch of undrained logs to every target
	pub async fn flush(&self, batch_size: usize) -> Result<DrainReport, DrainError> {
		let logs = self
			.storage
			.list_undrained(batch_size)
			.await
			.map_err(|e| DrainError::Storage(e.to_string()))?;

		if logs.is_empty() || self.targets.is_empty() {
			debug!(
				"Nothing to drain ({} logs, {} targets)",
				logs.len(),
				self.targets.len()
			);
			return Ok(DrainReport {
				batch_size: logs.len(),
				outcomes: Vec::new(),
				marked: false,
			});
		}

		info!(
			"Draining {} logs to {} target(s)",
			logs.len(),
			self.targets.len()
		);

		let payload = Arc::new(json!({
			"source": "commerce-ops",
			"count": logs.len(),
			"logs": logs,
		}));

		let tasks = self.targets.iter().cloned().map(|target| {
			let client = self.client.clone();
			let payload = Arc::clone(&payload);
			let batch = logs.len();

			tokio::spawn(async move {
				let mut request = client.post(&target.endpoint).json(payload.as_ref());
				if let Some(token) = &target.token {
					request = request.bearer_auth(token.expose_secret());
				}

				match request.send().await {
					Ok(response) if response.status().is_success() => {
						debug!("Drain {} accepted {} logs", target.name, batch);
						DrainOutcome::ok(target.name, batch)
					},
					Ok(response) => {
						let status = response.status();
						warn!("Drain {} rejected batch: {}", target.name, status);
						DrainOutcome::failed(target.name, format!("HTTP {}", status))
					},
					Err(e) => {
						warn!("Drain {} unreachable: {}", target.name, e);
						DrainOutcome::failed(target.name, e.to_string())
					},
				}
			})
		});

		// All-settled join under the global timeout; targets that did not
		// finish in time count as failed.
		let global = Duration::from_millis(self.global_timeout_ms);
		let outcomes: Vec<DrainOutcome> = match timeout(global, join_all(tasks)).await {
			Ok(results) => results
				.into_iter()
				.zip(self.targets.iter())
				.map(|(result, target)| match result {
					Ok(outcome) => outcome,
					Err(e) => DrainOutcome::failed(target.name.clone(), e.to_string()),
				})
				.collect(),
			Err(_) => {
				warn!(
					"Drain fan-out timed out after {}ms",
					self.global_timeout_ms
				);
				self.targets
					.iter()
					.map(|t| DrainOutcome::failed(t.name.clone(), "global timeout".to_string()))
					.collect()
			},
		};

		let all_delivered = outcomes.iter().all(DrainOutcome::is_ok);
		if all_delivered {
			let ids: Vec<DocId> = logs.iter().map(|l| l.id.clone()).collect();
			self.storage
				.mark_drained(&ids)
				.await
				.map_err(|e| DrainError::Storage(e.to_string()))?;
		}

		info!(
			"Drain run complete: {}/{} targets ok, marked={}",
			outcomes.iter().filter(|o| o.is_ok()).count(),
			outcomes.len(),
			all_delivered
		);

		Ok(DrainReport {
			batch_size: logs.len(),
			outcomes,
			marked: all_delivered,
		})
	}
}

/// Persists one function log per handled request
#[derive(Clone)]
pub struct RequestLogService {
	storage: Arc<dyn DocumentStore>,
}

impl RequestLogService {
	pub fn new(storage: Arc<dyn DocumentStore>) -> Self {
		Self { storage }
	}

	/// Record an invocation; logging failures are logged, never surfaced
	pub async fn record(&self, log: FunctionLog) {
		if let Err(e) = self.storage.append_log(log).await {
			warn!("Failed to persist function log: {}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ops_storage::MemoryStore;

	fn target(name: &str, endpoint: &str) -> DrainTargetSpec {
		DrainTargetSpec {
			name: name.to_string(),
			endpoint: endpoint.to_string(),
			token: None,
		}
	}

	#[tokio::test]
	async fn test_flush_with_no_logs_is_a_noop() {
		let store = Arc::new(MemoryStore::new());
		let service = DrainService::new(
			store,
			vec![target("a", "http://127.0.0.1:1/hook")],
			1000,
		);

		let report = service.flush(DEFAULT_BATCH_SIZE).await.unwrap();
		assert_eq!(report.batch_size, 0);
		assert!(report.outcomes.is_empty());
		assert!(!report.marked);
	}

	#[tokio::test]
	async fn test_unreachable_target_fails_without_marking() {
		let store = Arc::new(MemoryStore::new());
		store
			.append_log(FunctionLog::new("checkout".to_string(), 200, 10))
			.await
			.unwrap();

		// Port 1 refuses connections; the outcome is a per-target failure
		let service = DrainService::new(
			store.clone(),
			vec![target("dead", "http://127.0.0.1:1/hook")],
			2000,
		);

		let report = service.flush(DEFAULT_BATCH_SIZE).await.unwrap();
		assert_eq!(report.outcomes.len(), 1);
		assert!(!report.outcomes[0].is_ok());
		assert!(!report.marked);

		// The batch stays pending for the next flush
		assert_eq!(store.list_undrained(10).await.unwrap().len(), 1);
	}
}
