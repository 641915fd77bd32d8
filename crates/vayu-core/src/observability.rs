//! Tracing bootstrap for hub binaries.
//!
//! ## Logging Architecture
//! - **stdout**: WARN only (keeps the console readable under steady ingest)
//! - **file**: INFO for vayu crates, WARN for deps (daily rotation)
//! - **RUST_LOG**: Honored for file logs only; stdout always bounded to WARN

use std::{fs, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Guards that must be held for the lifetime of the process.
/// Dropping this will cause buffered logs to be lost.
pub struct TracingGuards {
    _file_guard: WorkerGuard,
}

/// Ensures the logs directory exists.
fn ensure_logs_dir() {
    let dir = Path::new("logs");
    if !dir.exists() {
        // Best effort: if this fails, we still want stdout logs to work.
        let _ = fs::create_dir_all(dir);
    }
}

/// Initializes tracing with bounded stdout + rotated file logs.
///
/// # Logging Policy
/// - **stdout**: Always WARN only (hard-coded, ignores RUST_LOG)
///   - Compact format, no timestamps (human-friendly)
/// - **file**: INFO for vayu crates, WARN for deps (honors RUST_LOG override)
///   - Daily rotation to `logs/{service_name}.log`
///   - Non-blocking so a slow disk never stalls the ingest loop
///   - Full metadata (timestamps, thread IDs, targets)
///
/// # Returns
/// `TracingGuards` - Must be held for the lifetime of the process or logs
/// may be lost.
pub fn init_tracing(service_name: &str) -> TracingGuards {
    ensure_logs_dir();

    // --- File Appender (non-blocking, daily rotation) ---
    let file_appender =
        tracing_appender::rolling::daily("logs", format!("{}.log", service_name));
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    // --- Filter Definitions ---
    // stdout: ALWAYS WARN only (hard guarantee, ignores RUST_LOG).
    let stdout_filter = EnvFilter::new("warn");

    // file: Default to INFO for our crates, WARN for noisy deps.
    // Honors RUST_LOG if set (for debugging), otherwise safe default.
    let default_file_filter =
        "vayu_core=info,vayu_store=info,vayu_connectors_mqtt=info,vayu_runner=info,vayu_hub=info,warn";
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_file_filter));

    // --- stdout Layer: Bounded, Human-Friendly ---
    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(true)
        .compact()
        .with_filter(stdout_filter);

    // --- File Layer: Detailed, Non-Blocking ---
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Observability initialized for service: {} (stdout=WARN, file=logs/{}.log)",
        service_name,
        service_name
    );

    TracingGuards {
        _file_guard: file_guard,
    }
}
