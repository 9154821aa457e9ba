/// File logging for the dashboard
///
/// The dashboard owns the terminal, so tracing output goes to a log file
/// instead of stdout/stderr.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::app_config::AppConfig;
use super::constants::LOG_ENV;
use super::helpers::ensure_private_dir;

/// Build the log filter: `SERVER_CHECK_LOG` wins over the configured level
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(format!("server_check={level}")))
        .unwrap_or_else(|_| EnvFilter::new("server_check=info"))
}

/// Initialize tracing, appending to the configured log file
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_private_dir(parent)?;
    }

    init_file_logging(&path, &config.log_level)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %path.display(),
        "Logging initialized"
    );

    Ok(())
}

fn init_file_logging(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
