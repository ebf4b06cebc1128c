#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod monitor_config;
mod recording_config;

pub(crate) use {
    config::Config, logging_config::LoggingConfig, monitor_config::MonitorConfig,
    recording_config::RecordingConfig,
};

pub(crate) const DEFAULT_LOG_FILTER: &str = "live_recorder=info,live_recorder_core=info";
pub(crate) const DEFAULT_ROUTE_POLL_MS: u64 = 500;

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

pub(crate) fn default_route_poll_ms() -> u64 {
    DEFAULT_ROUTE_POLL_MS
}
