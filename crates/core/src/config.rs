//! Environment-backed engine configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Engine config ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Look-back window for cooldown checks, in days.
    pub alert_history_days: u32,
    /// Upper bound on any single store call, in seconds.
    pub store_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alert_history_days: 7,
            store_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            alert_history_days: env_u32("VIGIL_ALERT_HISTORY_DAYS", defaults.alert_history_days),
            store_timeout_secs: env_u64("VIGIL_STORE_TIMEOUT_SECS", defaults.store_timeout_secs),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Engine config loaded:");
        tracing::info!(
            "  alerts: history_days={}, store_timeout_secs={}",
            self.alert_history_days,
            self.store_timeout_secs
        );
    }

    /// Structured view for embedding applications to expose.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "alert_history_days": self.alert_history_days,
            "store_timeout_secs": self.store_timeout_secs,
        })
    }
}
