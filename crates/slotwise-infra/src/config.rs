//! Configuration loader for Slotwise.
//!
//! Reads `config.toml` from the data directory (`~/.slotwise/` in production)
//! and deserializes it into [`SlotwiseConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use slotwise_types::config::SlotwiseConfig;

/// Lower bound on the lock wait; anything shorter turns ordinary contention
/// into `Busy` errors.
const MIN_LOCK_TIMEOUT_MS: u64 = 10;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`SlotwiseConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> SlotwiseConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return SlotwiseConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return SlotwiseConfig::default();
        }
    };

    match toml::from_str::<SlotwiseConfig>(&content) {
        Ok(mut config) => {
            if config.engine.lock_timeout_ms < MIN_LOCK_TIMEOUT_MS {
                tracing::warn!(
                    "lock_timeout_ms = {} is below the minimum, using {MIN_LOCK_TIMEOUT_MS}",
                    config.engine.lock_timeout_ms
                );
                config.engine.lock_timeout_ms = MIN_LOCK_TIMEOUT_MS;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            SlotwiseConfig::default()
        }
    }
}
