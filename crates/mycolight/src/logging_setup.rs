use anyhow::{Context, Result};
use mycolight_core::LogConfig;
use std::fs::OpenOptions;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Keeps the file writer thread alive; drop it last so buffered lines flush
pub struct LogGuard {
    _guard: WorkerGuard,
}

fn filter(config: &LogConfig) -> EnvFilter {
    // RUST_LOG wins over the configured level
    EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy()
}

/// Install the global subscriber described by `config`
///
/// Returns a guard when file output is enabled.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter(config))
    });

    let mut guard = None;
    let file_layer = if config.file_output {
        config
            .ensure_log_directory()
            .context("Failed to create log directory")?;
        match config.cleanup_old_logs() {
            Ok(0) => {}
            Ok(n) => eprintln!("Removed {} old log file(s)", n),
            Err(e) => eprintln!("Warning: could not clean up old logs: {}", e),
        }

        // One file per day; restarts on the same day append to it
        let path = config.current_log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {:?}", path))?;
        let (writer, worker) = tracing_appender::non_blocking(file);
        guard = Some(LogGuard { _guard: worker });

        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(config)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::debug!(
        "Logging at level {} (console: {}, file: {})",
        config.level,
        config.console_output,
        config.file_output
    );
    Ok(guard)
}
