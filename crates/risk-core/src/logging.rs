use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogRotation, LoggingConfig};

/// Filter directives in this variable win over `RUST_LOG` and the config.
pub const FILTER_ENV: &str = "RISK_LOG";

/// Install the global tracing subscriber.
///
/// Stderr always gets a layer (compact, or JSON with `stderr_json`). A JSON
/// file layer is added when `log_dir` is set; the returned guard then
/// **must** be held for the lifetime of the process, since dropping it
/// flushes and closes the file writer.
pub fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&logging.default_filter)?;

    let (file_layer, guard) = match file_appender(logging)? {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_json = logging
        .stderr_json
        .then(|| fmt::layer().with_writer(std::io::stderr).json());
    let stderr_compact = (!logging.stderr_json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_json)
        .with(stderr_compact)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

/// `RISK_LOG`, then `RUST_LOG`, then the configured default. A variable that
/// is set but malformed is an error rather than silently ignored.
fn build_filter(default: &str) -> Result<EnvFilter> {
    for var in [FILTER_ENV, EnvFilter::DEFAULT_ENV] {
        if let Ok(directives) = std::env::var(var) {
            if !directives.trim().is_empty() {
                return EnvFilter::try_new(&directives)
                    .with_context(|| format!("invalid log filter in {var}: '{directives}'"));
            }
        }
    }
    EnvFilter::try_new(default).with_context(|| format!("invalid default log filter '{default}'"))
}

fn file_appender(logging: &LoggingConfig) -> Result<Option<RollingFileAppender>> {
    let Some(dir) = logging.log_dir.as_deref().filter(|d| !d.trim().is_empty()) else {
        return Ok(None);
    };
    let dir = Path::new(dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let rotation = match logging.rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    };
    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(logging.file_name.clone())
        .build(dir)
        .with_context(|| format!("failed to open log file in {}", dir.display()))?;
    Ok(Some(appender))
}
