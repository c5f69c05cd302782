//! Configuration for wallet-guard.
//!
//! Settings are loaded with priority: env var > TOML file > default.
//! A `.env` in the working directory is loaded via dotenvy early in startup.

pub(crate) mod helpers;

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::logging::LogFormat;
use crate::network::{ChainId, NativeCurrency, NetworkRequirement};
use crate::settings::{NetworkSettings, ProviderSettings, Settings};

pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkRequirement,
    pub provider: ProviderConfig,
    pub log_format: LogFormat,
}

/// Wallet bridge settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub bridge_url: Option<Url>,
    pub timeout_ms: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn resolve(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let bridge_url = helpers::env_or_file(
            "WALLET_GUARD_PROVIDER_URL",
            "provider.bridge_url",
            settings.bridge_url.clone(),
            |raw| raw,
        )?
        .map(|s| helpers::parse_http_url(&s.key, &s.value))
        .transpose()?;

        let timeout_ms = match helpers::env_or_file(
            "WALLET_GUARD_PROVIDER_TIMEOUT_MS",
            "provider.timeout_ms",
            settings.timeout_ms.map(|ms| ms.to_string()),
            |raw| raw,
        )? {
            Some(s) => match s.value.parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: s.key,
                        message: "must be > 0".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: s.key,
                        message: format!("must be a positive integer: {e}"),
                    });
                }
            },
            None => DEFAULT_PROVIDER_TIMEOUT_MS,
        };

        Ok(Self {
            bridge_url,
            timeout_ms,
        })
    }
}

fn url_list(
    env_key: &str,
    file_key: &str,
    file_value: Option<Vec<String>>,
    default: Vec<Url>,
) -> Result<Vec<Url>, ConfigError> {
    match helpers::env_or_file(env_key, file_key, file_value, |raw| {
        helpers::split_list(&raw)
    })? {
        Some(s) => {
            let urls = helpers::parse_url_list(&s.key, &s.value)?;
            if urls.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: s.key,
                    message: "at least one URL is required".to_string(),
                });
            }
            Ok(urls)
        }
        None => Ok(default),
    }
}

/// Resolve the required network from env overrides on top of file settings
/// on top of EDU Chain Testnet.
pub(crate) fn resolve_network(
    settings: &NetworkSettings,
) -> Result<NetworkRequirement, ConfigError> {
    let defaults = NetworkRequirement::edu_testnet();

    let chain_id = match helpers::env_or_file(
        "WALLET_GUARD_CHAIN_ID",
        "network.chain_id",
        settings.chain_id.clone(),
        |raw| raw,
    )? {
        Some(s) => s
            .value
            .parse::<ChainId>()
            .map_err(|e| ConfigError::InvalidValue {
                key: s.key,
                message: e.to_string(),
            })?,
        None => defaults.chain_id,
    };

    let display_name = helpers::optional_env("WALLET_GUARD_CHAIN_NAME")?
        .or_else(|| settings.display_name.clone())
        .unwrap_or(defaults.display_name);

    let rpc_endpoints = url_list(
        "WALLET_GUARD_RPC_URLS",
        "network.rpc_urls",
        settings.rpc_urls.clone(),
        defaults.rpc_endpoints,
    )?;

    let explorer_urls = match helpers::env_or_file(
        "WALLET_GUARD_EXPLORER_URLS",
        "network.explorer_urls",
        settings.explorer_urls.clone(),
        |raw| helpers::split_list(&raw),
    )? {
        Some(s) => helpers::parse_url_list(&s.key, &s.value)?,
        None => defaults.explorer_urls,
    };

    let decimals = helpers::optional_env("WALLET_GUARD_CURRENCY_DECIMALS")?
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: "WALLET_GUARD_CURRENCY_DECIMALS".to_string(),
            message: format!("must be an integer between 0 and 255: {e}"),
        })?
        .or(settings.currency_decimals)
        .unwrap_or(defaults.native_currency.decimals);

    let native_currency = NativeCurrency {
        name: helpers::optional_env("WALLET_GUARD_CURRENCY_NAME")?
            .or_else(|| settings.currency_name.clone())
            .unwrap_or(defaults.native_currency.name),
        symbol: helpers::optional_env("WALLET_GUARD_CURRENCY_SYMBOL")?
            .or_else(|| settings.currency_symbol.clone())
            .unwrap_or(defaults.native_currency.symbol),
        decimals,
    };

    Ok(NetworkRequirement {
        chain_id,
        display_name,
        rpc_endpoints,
        native_currency,
        explorer_urls,
    })
}

impl Config {
    /// Load from `.env`, the default TOML file (if present) and env vars.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_toml(None)
    }

    /// Like [`Config::from_env`], with an explicit TOML path. A missing or
    /// unparsable explicit file is an error.
    pub fn from_env_with_toml(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let settings = Self::load_settings(toml_path)?;
        Self::build(&settings)
    }

    fn load_settings(explicit_path: Option<&Path>) -> Result<Settings, ConfigError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Settings::default_toml_path);

        match Settings::load_toml(&path) {
            Ok(Some(settings)) => {
                tracing::debug!("Loaded TOML config from {}", path.display());
                Ok(settings)
            }
            Ok(None) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Ok(Settings::default())
            }
            Err(e) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Failed to load config file {}: {}",
                        path.display(),
                        e
                    )));
                }
                tracing::warn!("Failed to load default config file: {}", e);
                Ok(Settings::default())
            }
        }
    }

    /// Build config from already-loaded settings plus env overrides.
    pub fn build(settings: &Settings) -> Result<Self, ConfigError> {
        let log_format = match helpers::env_or_file(
            "WALLET_GUARD_LOG_FORMAT",
            "log_format",
            settings.log_format.clone(),
            |raw| raw,
        )? {
            Some(s) => LogFormat::parse(&s.value, &s.key)?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            network: resolve_network(&settings.network)?,
            provider: ProviderConfig::resolve(&settings.provider)?,
            log_format,
        })
    }
}
