//! Service startup logging
//!
//! Logs service, build, and environment information once at startup so
//! deploy logs identify exactly what came up.

use std::env;
use tracing::info;

use crate::Settings;

/// Logs comprehensive service information at startup
pub fn log_service_info() {
	let service_name = "commerce-ops";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Commerce Ops Service Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {}", env::consts::OS);
	info!("🏗️ Architecture: {}", env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the parts of the configuration that are safe to print
pub fn log_configuration(settings: &Settings) {
	info!(
		"📦 Content store: {} (dataset {}, api {})",
		settings.content_store.endpoint,
		settings.content_store.dataset,
		settings.content_store.api_version
	);

	let vendors = settings.enabled_vendors();
	if vendors.is_empty() {
		info!("🔌 Vendors: none enabled (mock gateways expected)");
	} else {
		info!("🔌 Vendors enabled: {}", vendors.join(", "));
	}

	info!("🚰 Log drains configured: {}", settings.drains.len());
	for drain in &settings.drains {
		info!("  - {}: {}", drain.name, drain.endpoint);
	}
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 Commerce Ops Service Shutting Down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs startup completion
pub fn log_startup_complete(bind_address: &str) {
	info!("✅ Commerce Ops Service Started Successfully");
	info!("🌐 Server listening on: {}", bind_address);
	info!("📡 Ready to accept requests");
}
