use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::RosterConfig;

/// Used when `log_level` is blank or unusable.
const DEFAULT_FILTER: &str = "info,roster_core=debug,roster_export=debug";

/// Log file prefix; the appender adds the date (`roster.2024-10-01`).
const LOG_FILE_PREFIX: &str = "roster";

/// Turns the configured `log_level` into an `EnvFilter` directive.
///
/// A bare level (`warn`, `DEBUG`, `off`) applies to everything. A full
/// directive (`info,roster_export=trace`) is taken as written. Anything else
/// falls back to [`DEFAULT_FILTER`] so a typo in the config file never
/// silences the log.
pub fn filter_directive(log_level: &str) -> String {
    let level = log_level.trim();
    if level.is_empty() {
        return DEFAULT_FILTER.to_string();
    }
    if level.parse::<LevelFilter>().is_ok() {
        return level.to_ascii_lowercase();
    }
    if level.contains('=') && EnvFilter::try_new(level).is_ok() {
        return level.to_string();
    }
    DEFAULT_FILTER.to_string()
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(log_level: &str) -> (EnvFilter, String) {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            let shown = filter.to_string();
            (filter, shown)
        }
        Err(_) => {
            let directive = filter_directive(log_level);
            (EnvFilter::new(&directive), directive)
        }
    }
}

/// Initializes file + console logging at the level named in `config`.
/// Returns a guard that must be kept alive for the duration of the app.
pub fn init_logging(config: &RosterConfig) -> Result<WorkerGuard> {
    let logs_dir = RosterConfig::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let (filter, directive) = env_filter(&config.log_level);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(non_blocking))
        .with(fmt::layer().with_target(false).compact())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!(filter = %directive, dir = %logs_dir.display(), "Logging initialized");
    Ok(guard)
}

/// File-only logging into `logs_dir`, for tests and embedding hosts that
/// keep their own console output.
pub fn init_logging_to_dir(logs_dir: &Path, log_level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let (filter, directive) = env_filter(log_level);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!(filter = %directive, "Logging initialized");
    Ok(guard)
}
