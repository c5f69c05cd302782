//! File-backed settings.
//!
//! Stored as TOML in `~/.wallet-guard/config.toml`. Every field is optional;
//! config resolution applies env var > this file > built-in default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub network: NetworkSettings,

    #[serde(default)]
    pub provider: ProviderSettings,

    /// Log output: "pretty" or "json".
    #[serde(default)]
    pub log_format: Option<String>,
}

/// Overrides for the required network descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Hex (`0xa045c`) or decimal (`656476`) chain id.
    #[serde(default)]
    pub chain_id: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub rpc_urls: Option<Vec<String>>,

    #[serde(default)]
    pub explorer_urls: Option<Vec<String>>,

    #[serde(default)]
    pub currency_name: Option<String>,

    #[serde(default)]
    pub currency_symbol: Option<String>,

    #[serde(default)]
    pub currency_decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// JSON-RPC wallet bridge. Unset means no wallet is available.
    #[serde(default)]
    pub bridge_url: Option<String>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Default TOML config file path (~/.wallet-guard/config.toml).
    pub fn default_toml_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wallet-guard")
            .join("config.toml")
    }

    /// Load settings from a TOML file.
    ///
    /// Returns `None` if the file doesn't exist. Returns an error only
    /// if the file exists but can't be parsed.
    pub fn load_toml(path: &Path) -> Result<Option<Self>, String> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
        };

        let settings: Self = toml::from_str(&data)
            .map_err(|e| format!("invalid TOML in {}: {}", path.display(), e))?;
        Ok(Some(settings))
    }
}
