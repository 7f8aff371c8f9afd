//! Filesystem helpers for Slotwise.
//!
//! Resolves the data directory that holds `slotwise.db` and `config.toml`.

use std::path::PathBuf;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SLOTWISE_DATA_DIR` environment variable
/// 2. `~/.slotwise` under the user's home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SLOTWISE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".slotwise");
    }

    // Last resort: current directory
    PathBuf::from(".slotwise")
}
