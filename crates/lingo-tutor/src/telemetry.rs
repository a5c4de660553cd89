use crate::config::{LogFormat, LogRotation, TelemetryConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter, Layer};

/// File name prefix for rolling JSON log files written below `APP_LOG_DIR`.
pub const LOG_FILE_PREFIX: &str = "lingo-tutor.log";

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Handle returned by [`init`]. Holding it keeps the background log writer alive;
/// dropping it (or calling [`TelemetryGuard::shutdown`]) flushes buffered lines.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    file_writer: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl TelemetryGuard {
    /// Guard for callers that never installed a subscriber (CLI tools, tests).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Directory receiving JSON log files, when file output is enabled.
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    pub fn shutdown(self) {
        if self.file_writer.is_some() {
            tracing::info!("flushing log writer");
        }
        drop(self);
    }
}

pub fn init(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    let stdout_layer = match config.format {
        LogFormat::Compact => fmt_layer::layer()
            .with_target(false)
            .compact()
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt_layer::layer().json().with_target(true).boxed(),
    };

    let (file_layer, file_writer) = match &config.log_dir {
        Some(dir) => {
            let appender = match config.rotation {
                LogRotation::Daily => rolling::daily(dir, LOG_FILE_PREFIX),
                LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_PREFIX),
                LogRotation::Never => rolling::never(dir, LOG_FILE_PREFIX),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt_layer::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| TelemetryError::Subscriber(Box::new(err)))?;

    Ok(TelemetryGuard {
        file_writer,
        log_dir: config.log_dir.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_filter() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "lingo_tutor=loudest".to_string(),
            ..TelemetryConfig::default()
        };
        let err = init(&config).expect_err("malformed directive");
        assert!(matches!(err, TelemetryError::EnvFilter { .. }));
    }

    #[test]
    fn disabled_guard_has_no_log_dir() {
        let guard = TelemetryGuard::disabled();
        assert!(guard.log_dir().is_none());
        guard.shutdown();
    }
}
