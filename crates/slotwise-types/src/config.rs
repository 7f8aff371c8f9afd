//! Configuration types for Slotwise.
//!
//! `SlotwiseConfig` represents the top-level `config.toml` that controls
//! lock timeouts, the pending-expiry policy, and the HTTP listener.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
/// All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotwiseConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Slot engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on waiting for a per-provider or per-booking lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Capacity given to imported providers that do not specify one.
    #[serde(default = "default_total_slots")]
    pub default_total_slots: u32,

    /// Pending bookings older than this are cancelled by the expiry sweep.
    /// Unset means pending bookings never expire.
    #[serde(default)]
    pub pending_ttl_secs: Option<u64>,

    /// How often `serve` runs the expiry sweep when a TTL is configured.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_total_slots() -> u32 {
    4
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl EngineConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn pending_ttl(&self) -> Option<Duration> {
        self.pending_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            default_total_slots: default_total_slots(),
            pending_ttl_secs: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// REST listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = SlotwiseConfig::default();
        assert_eq!(config.engine.lock_timeout_ms, 2_000);
        assert_eq!(config.engine.default_total_slots, 4);
        assert!(config.engine.pending_ttl().is_none());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: SlotwiseConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine.lock_timeout(), Duration::from_secs(2));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[engine]
lock_timeout_ms = 250
pending_ttl_secs = 3600
sweep_interval_secs = 0

[server]
port = 8080
"#;
        let config: SlotwiseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.engine.pending_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.engine.sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.engine.default_total_slots, 4);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
