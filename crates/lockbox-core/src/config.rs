use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxConfig {
    pub keychain: KeychainConfig,
    pub log: LogConfig,
}

/// Which protected store backs the vault
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Platform keychain (Keychain Services, Credential Manager, kernel keyutils)
    #[default]
    Keyring,
    /// Process-local store; items vanish on exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    /// Service namespace items are filed under (default: lockbox)
    pub service: String,
    pub backend: BackendKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info); RUST_LOG takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            service: "lockbox".into(),
            backend: BackendKind::Keyring,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

/// Default config file location: $XDG_CONFIG_HOME/lockbox/config.toml
pub fn default_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        })
        .join("lockbox")
        .join("config.toml")
}
