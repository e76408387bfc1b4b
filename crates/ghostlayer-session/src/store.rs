//! Rule persistence
//!
//! User rules, custom patterns and the whitelist outlive a session. The
//! session talks to a `RuleStore`; which backend sits behind it is invisible
//! to both the session and the engine.

mod atomic_writer;

use async_trait::async_trait;
use ghostlayer_core::{Error, Result};
use ghostlayer_redact::RuleSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

pub use atomic_writer::write_atomic;

/// Everything a store persists
pub type StoredState = RuleSet;

/// Persistence backend for rules, patterns and the whitelist
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Load the stored state; an empty store yields the default state
    async fn load(&self) -> Result<StoredState>;

    /// Replace the stored state
    async fn save(&self, state: &StoredState) -> Result<()>;
}

/// Volatile store, mostly for tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    state: RwLock<StoredState>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn load(&self) -> Result<StoredState> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        *self.state.write().await = state.clone();
        Ok(())
    }
}

/// Pretty-printed JSON document on disk, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFileRuleStore {
    path: PathBuf,
}

impl JsonFileRuleStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleStore for JsonFileRuleStore {
    async fn load(&self) -> Result<StoredState> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No rule store at {}, starting empty", self.path.display());
            return Ok(StoredState::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(StoredState::default());
        }

        let state: StoredState = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} rules, {} patterns, {} whitelist entries from {}",
            state.user_rules.len(),
            state.custom_patterns.len(),
            state.whitelist.len(),
            self.path.display()
        );
        Ok(state)
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &data))
        .await
        .map_err(|e| Error::Store(format!("Rule store write task failed: {}", e)))?
    }
}
