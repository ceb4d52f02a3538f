use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".symtree/logs")
}

/// Log to `~/.symtree/logs`, one daily file per view.
pub fn init_logging(config: &TreeConfig, to_stderr: bool) -> Result<WorkerGuard> {
    init_logging_in(&log_dir(), config, to_stderr)
}

/// Install the global subscriber writing to `dir`.
///
/// Files are named after the view id, e.g. `references-view.tree.2024-01-21`.
/// `RUST_LOG` overrides the configured filter. When a global subscriber is
/// already installed the file is still created but receives nothing.
pub fn init_logging_in(dir: &Path, config: &TreeConfig, to_stderr: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .map_err(|e| TreeError::Logging(format!("{}: {}", dir.display(), e)))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| TreeError::Config(format!("log_filter: {}", e)))?,
    };

    let file_appender = tracing_appender::rolling::daily(dir, &config.view_id);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already set, keeping it");
    }

    Ok(guard)
}
