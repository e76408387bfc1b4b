use anyhow::{Context, anyhow};
use ghostlayer_redact::{EngineConfig, ToggleReconciliation};
use ghostlayer_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON rule store; a leading `~` expands to the home directory
    #[serde(default = "default_store_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            notification_ttl_ms: default_notification_ttl_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("GHOSTLAYER_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("GHOSTLAYER_STORE") {
            self.store.path = val;
        }

        if let Ok(val) = std::env::var("GHOSTLAYER_RECONCILIATION") {
            match val.to_lowercase().as_str() {
                "reset" => self.engine.toggle_reconciliation = ToggleReconciliation::Reset,
                "entity_key" => self.engine.toggle_reconciliation = ToggleReconciliation::EntityKey,
                _ => eprintln!(
                    "Warning: Invalid GHOSTLAYER_RECONCILIATION '{}', using {:?}",
                    val, self.engine.toggle_reconciliation
                ),
            }
        }

        if let Ok(val) = std::env::var("GHOSTLAYER_PROPAGATE")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.engine.propagate_entities = enabled;
        }
    }

    /// Session configuration carrying this config's engine section
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_limit: self.session.history_limit,
            notification_ttl_ms: self.session.notification_ttl_ms,
            engine: self.engine.clone(),
        }
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        expand_home(&self.store.path)
    }
}

fn expand_home(path: &str) -> anyhow::Result<PathBuf> {
    let Some(rest) = path.strip_prefix('~') else {
        return Ok(PathBuf::from(path));
    };

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

fn default_history_limit() -> usize {
    SessionConfig::default().history_limit
}

fn default_notification_ttl_ms() -> u64 {
    SessionConfig::default().notification_ttl_ms
}

fn default_store_path() -> String {
    "~/.ghostlayer/store.json".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}
