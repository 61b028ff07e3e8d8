//! Telemetry setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogSettings;
use crate::error::AppError;

/// Installs the global subscriber. The returned guard flushes the
/// non-blocking writer on drop and must live as long as the process.
pub fn init_telemetry(settings: &LogSettings) -> Result<WorkerGuard, AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match &settings.directory {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "inkbook.log")),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if settings.json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(writer))
            .try_init()
    };

    result.map_err(|e| AppError::TelemetryError(e.to_string()))?;
    Ok(guard)
}
