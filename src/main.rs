use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use commerce_ops::service::backfill::{job_by_name, standard_jobs};
use commerce_ops::{
	api_key_authenticator_from_settings, load_config, BackfillJob, BackfillOptions,
	BackfillRunner, OpsBuilder, Settings,
};

#[tokio::main]
async fn main() -> ExitCode {
	let args: Vec<String> = env::args().collect();

	match args.get(1).map(String::as_str) {
		Some("backfill") => run_backfill(&args[2..]).await,
		Some("--help") | Some("-h") => {
			print_usage();
			ExitCode::SUCCESS
		},
		_ => run_server().await,
	}
}

fn print_usage() {
	println!("commerce-ops: operations backend for the storefront");
	println!();
	println!("USAGE:");
	println!("  commerce-ops                 start the HTTP service");
	println!("  commerce-ops backfill <job> [--dry-run] [--page-size N] [--cursor ID]");
	println!();
	println!("BACKFILL JOBS:");
	for job in standard_jobs() {
		println!("  {:<14} {}", job.name(), job.description());
	}
	println!("  all            run every job in order");
}

async fn run_server() -> ExitCode {
	dotenvy::dotenv().ok();
	let settings = load_config().unwrap_or_default();

	// Prefer the content store when its token is configured; otherwise run
	// on in-memory storage (dev mode, nothing survives a restart).
	#[cfg(feature = "content-api")]
	if let Some(store) = content_store(&settings) {
		return finish(serve(store, settings).await);
	}

	eprintln!("content store not configured; serving from in-memory storage");
	finish(serve(commerce_ops::MemoryStore::new(), settings).await)
}

fn finish(result: Result<(), Box<dyn std::error::Error>>) -> ExitCode {
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Server failed: {}", e);
			ExitCode::FAILURE
		},
	}
}

/// Wire the builder and serve; API keys in settings switch the service from
/// open (dev) to key-gated.
async fn serve<S>(storage: S, settings: Settings) -> Result<(), Box<dyn std::error::Error>>
where
	S: commerce_ops::DocumentStore + Clone + 'static,
{
	if settings.security.api_keys.is_empty() {
		OpsBuilder::with_storage(storage)
			.with_settings(settings)
			.start_server()
			.await
	} else {
		let authenticator = api_key_authenticator_from_settings(&settings)?;
		OpsBuilder::with_storage(storage)
			.with_settings(settings)
			.with_auth(authenticator)
			.start_server()
			.await
	}
}

#[cfg(feature = "content-api")]
fn content_store(settings: &Settings) -> Option<commerce_ops::ContentApiStore> {
	use commerce_ops::{ContentApiConfig, ContentApiStore};

	let token = settings.content_store.token.resolve_secret().ok()?;
	ContentApiStore::new(ContentApiConfig {
		endpoint: settings.content_store.endpoint.clone(),
		dataset: settings.content_store.dataset.clone(),
		api_version: settings.content_store.api_version.clone(),
		token,
		request_timeout_ms: settings.timeouts.request_ms,
	})
	.ok()
}

/// Run one (or all) of the order backfill jobs against the configured
/// content store, then exit. `--dry-run` plans and counts without writing.
async fn run_backfill(args: &[String]) -> ExitCode {
	dotenvy::dotenv().ok();
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.init();

	let Some(job_name) = args.first() else {
		eprintln!("backfill: missing job name");
		print_usage();
		return ExitCode::FAILURE;
	};

	let mut options = BackfillOptions::default();
	let mut iter = args[1..].iter();
	while let Some(flag) = iter.next() {
		match flag.as_str() {
			"--dry-run" => options.dry_run = true,
			"--page-size" => match iter.next().and_then(|v| v.parse().ok()) {
				Some(size) => options.page_size = size,
				None => {
					eprintln!("backfill: --page-size needs a number");
					return ExitCode::FAILURE;
				},
			},
			"--cursor" => match iter.next() {
				Some(cursor) => options.start_cursor = Some(cursor.clone()),
				None => {
					eprintln!("backfill: --cursor needs a document id");
					return ExitCode::FAILURE;
				},
			},
			other => {
				eprintln!("backfill: unknown flag {}", other);
				return ExitCode::FAILURE;
			},
		}
	}

	let settings = load_config().unwrap_or_default();
	let storage = match backfill_storage(&settings) {
		Ok(storage) => storage,
		Err(e) => {
			eprintln!("backfill: {}", e);
			return ExitCode::FAILURE;
		},
	};
	let runner = BackfillRunner::new(storage);

	let jobs = if job_name == "all" {
		standard_jobs()
	} else {
		match job_by_name(job_name) {
			Some(job) => vec![job],
			None => {
				eprintln!("backfill: unknown job '{}'", job_name);
				print_usage();
				return ExitCode::FAILURE;
			},
		}
	};

	let mut failed = 0usize;
	for job in &jobs {
		let report = runner.run(job.as_ref(), &options).await;
		println!("{}", report.summary());
		failed += report.failed;
	}

	if failed > 0 {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	}
}

#[cfg(feature = "content-api")]
fn backfill_storage(
	settings: &Settings,
) -> Result<Arc<dyn commerce_ops::DocumentStore>, Box<dyn std::error::Error>> {
	use commerce_ops::{ContentApiConfig, ContentApiStore};

	let token = settings
		.content_store
		.token
		.resolve_secret()
		.map_err(|e| format!("content store token: {}", e))?;
	let store = ContentApiStore::new(ContentApiConfig {
		endpoint: settings.content_store.endpoint.clone(),
		dataset: settings.content_store.dataset.clone(),
		api_version: settings.content_store.api_version.clone(),
		token,
		request_timeout_ms: settings.timeouts.request_ms,
	})?;
	Ok(Arc::new(store))
}

#[cfg(not(feature = "content-api"))]
fn backfill_storage(
	_settings: &Settings,
) -> Result<Arc<dyn commerce_ops::DocumentStore>, Box<dyn std::error::Error>> {
	Err("built without the content-api feature; backfills need the content store".into())
}
