//! Logging initialization.
//!
//! Structured logging through `tracing`, pretty or JSON on stdout, or
//! plain lines appended to a file.

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

// The file writer flushes on drop; keep its guard for the program's lifetime.
static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

/// Initialize logging to stdout.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

/// Initialize logging appended to `log_file`.
pub fn init_telemetry_with_file(log_level: &str, log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()?;

    if let Ok(mut g) = LOG_GUARD.lock() {
        *g = Some(guard);
    }

    Ok(())
}

/// Initialize logging from the `[logging]` section, with command-line
/// overrides already applied.
pub fn init_from_config(logging: &LoggingConfig) -> anyhow::Result<()> {
    match &logging.log_file {
        Some(path) => init_telemetry_with_file(&logging.level, path),
        None => init_telemetry(&logging.level, logging.format == "json"),
    }
}
