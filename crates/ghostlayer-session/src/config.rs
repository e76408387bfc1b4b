//! Session configuration

use ghostlayer_redact::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of undo snapshots kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// How long a notification stays visible, in milliseconds
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,

    /// Detection engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            notification_ttl_ms: default_notification_ttl_ms(),
            engine: EngineConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

fn default_history_limit() -> usize {
    50
}

fn default_notification_ttl_ms() -> u64 {
    3000
}
