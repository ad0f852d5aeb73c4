//! Tracing subscriber setup: console always, daily-rolling file when a log dir is given.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "relaygate.log";

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `default_level`. Keep the returned guard alive for the
/// process lifetime or buffered file output is lost.
pub fn init_logger(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer().with_target(false).with_level(true);

    let (file_layer, guard) = match log_dir.map(prepare_log_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            (Some(layer), Some(guard))
        },
        Some(Err(e)) => {
            eprintln!("Failed to initialize log directory: {e}");
            (None, None)
        },
        None => (None, None),
    };

    // try_init: tests and embedders may have installed a subscriber already
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::debug!(file_logging = guard.is_some(), "Logger initialized");
    guard
}

fn prepare_log_dir(dir: &Path) -> std::io::Result<&Path> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(dir)
}
