//! Logging initialization
//!
//! Two outputs:
//! - stderr, compact, for the person running the command
//! - `<log_dir>/wallet-actions.log`, rotated daily, with targets and source locations
//!
//! The filter comes from `RUST_LOG` and falls back to the configured level.

use lib_core::Config;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "wallet-actions.log";
const FALLBACK_FILTER: &str = "wallet_actions=info,lib_solana=info,warn";

/// Filter from the environment, else `level`, else a fixed default.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive until exit.
pub fn init(config: &Config) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create log directory {}: {}",
            config.log_dir.display(),
            e
        )
    })?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        log_level = %config.log_level,
        "Logging initialized"
    );
    Ok(guard)
}
