//! Path utilities for arbiter.
//!
//! Data lives under `~/.arbiter/`:
//! - `~/.arbiter/config.toml` - main configuration
//! - `~/.arbiter/scenario.toml` - paper venue scenario

use std::path::PathBuf;

/// Returns the arbiter home directory (`~/.arbiter/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".arbiter")
}

/// Returns the default config file path (`~/.arbiter/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}
