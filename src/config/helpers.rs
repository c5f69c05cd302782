use url::Url;

use crate::error::ConfigError;

/// Read an env var, treating unset and blank values the same.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// A resolved value and the key it came from, for error messages.
pub(crate) struct Sourced<T> {
    pub value: T,
    pub key: String,
}

/// Env var if set, else the config-file value. `file_key` is the dotted TOML
/// path reported when the file value turns out to be invalid.
pub(crate) fn env_or_file<T>(
    env_key: &str,
    file_key: &str,
    file_value: Option<T>,
    from_env: impl FnOnce(String) -> T,
) -> Result<Option<Sourced<T>>, ConfigError> {
    if let Some(raw) = optional_env(env_key)? {
        return Ok(Some(Sourced {
            value: from_env(raw),
            key: env_key.to_string(),
        }));
    }
    Ok(file_value.map(|value| Sourced {
        value,
        key: file_key.to_string(),
    }))
}

/// Split a comma-separated env value into trimmed, non-empty entries.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a list of http(s) URLs, rejecting the whole list on the first bad
/// entry.
pub(crate) fn parse_url_list(key: &str, values: &[String]) -> Result<Vec<Url>, ConfigError> {
    values.iter().map(|raw| parse_http_url(key, raw)).collect()
}

pub(crate) fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}' is not a valid URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' must use http or https, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_value_reports_toml_key() {
        let sourced = env_or_file(
            "WALLET_GUARD_TEST_UNSET_KEY",
            "network.chain_id",
            Some("0x1".to_string()),
            |raw| raw,
        )
        .unwrap()
        .unwrap();
        assert_eq!(sourced.value, "0x1");
        assert_eq!(sourced.key, "network.chain_id");

        let missing: Option<Sourced<String>> =
            env_or_file("WALLET_GUARD_TEST_UNSET_KEY", "network.chain_id", None, |raw| raw)
                .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn url_list_rejects_non_http_schemes() {
        let err = parse_url_list("RPC", &["wss://rpc.example".to_string()]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "RPC");
                assert!(message.contains("http or https"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
