use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory for the daily rotated log files.
    pub log_dir: Utf8PathBuf,
    /// File name prefix, e.g. `modstacker` gives `modstacker.2026-10-19`.
    pub log_prefix: String,
    /// Use `debug` instead of `info` when `RUST_LOG` is not set.
    pub debug_mode: bool,
    /// Mirror log output to the terminal.
    pub console_output: bool,
}

impl LogOptions {
    pub fn new(log_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_prefix: crate::APP_NAME.to_string(),
            debug_mode: false,
            console_output: false,
        }
    }
}

/// Build the level filter: `RUST_LOG` wins, otherwise `debug`/`info` per `debug_mode`.
pub fn env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Create the log directory if it does not exist yet.
pub fn ensure_log_dir(options: &LogOptions) -> Result<()> {
    if !options.log_dir.exists() {
        fs::create_dir_all(&options.log_dir)
            .with_context(|| format!("Failed to create log directory: {}", options.log_dir))?;
    }
    Ok(())
}

/// Install the global tracing subscriber.
///
/// The returned guard flushes the non-blocking file writer on drop and must be
/// held for as long as the program logs.
pub fn setup_logging(options: &LogOptions) -> Result<WorkerGuard> {
    ensure_log_dir(options)?;

    let file_appender = rolling::daily(&options.log_dir, &options.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(options.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        options.log_dir,
        options.log_prefix,
        options.debug_mode,
        options.console_output
    );

    Ok(guard)
}
