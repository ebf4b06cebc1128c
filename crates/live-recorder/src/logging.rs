use crate::{AppError, AppResult, config::{Config, LoggingConfig}};

use std::{fs, panic::Location};

use error_location::ErrorLocation;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "live-recorder.log";

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays free for command replies.
/// The returned guard flushes the log file on drop and must be held for the
/// life of the process.
#[track_caller]
pub(crate) fn init(config: &LoggingConfig) -> AppResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| AppError::LoggingError {
            reason: format!("Invalid log filter '{}': {}", config.filter, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let (file_layer, guard) = if config.log_to_file {
        let log_dir = Config::log_dir()?;
        fs::create_dir_all(&log_dir)?;
        let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().json().with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::LoggingError {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(guard)
}
