use crate::config::default_route_poll_ms;

use serde::{Deserialize, Serialize};

/// Input route monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How often the default input device is polled. `0` disables monitoring.
    #[serde(default = "default_route_poll_ms")]
    pub route_poll_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            route_poll_ms: default_route_poll_ms(),
        }
    }
}
