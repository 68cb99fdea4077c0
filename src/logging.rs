//! File logging. Nothing goes to the terminal, so `--json` output stays parseable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_LEVEL_ENV: &str = "CUSTOM_FIELD_ORDER_LOG_LEVEL";

/// Keeps the background writer alive; dropping it flushes pending lines.
pub struct LogGuard {
    path: PathBuf,
    _worker: WorkerGuard,
}

impl LogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn init_logging() -> anyhow::Result<LogGuard> {
    let dir = log_directory().context("failed to determine local data directory")?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory '{}'", dir.display()))?;

    let prefix = log_file_prefix(Local::now().naive_local());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&prefix)
        .filename_suffix("log")
        .build(&dir)
        .context("failed to open log file")?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(log_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref()))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .context("a global subscriber is already installed")?;

    let path = dir.join(format!("{prefix}.log"));
    tracing::info!(
        path = %path.display(),
        version = env!("CUSTOM_FIELD_ORDER_BUILD_VERSION"),
        "logging initialized"
    );
    Ok(LogGuard {
        path,
        _worker: worker,
    })
}

/// Dependencies stay at `warn`; this crate follows the requested level.
fn log_filter(raw_level: Option<&str>) -> EnvFilter {
    let level = raw_level.and_then(normalize_log_level).unwrap_or("warn");
    EnvFilter::new(format!("warn,custom_field_order={level}"))
}

fn normalize_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn log_directory() -> Option<PathBuf> {
    Some(dirs::data_local_dir()?.join("custom-field-order").join("logs"))
}

fn log_file_prefix(started: NaiveDateTime) -> String {
    format!("custom-field-order-{}", started.format("%Y-%m-%d_%H-%M-%S"))
}
