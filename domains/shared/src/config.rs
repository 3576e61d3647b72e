//! Configuration for the hosted backend, address lookup and logging.

use serde::{Deserialize, Serialize};

pub const ENV_BACKEND_URL: &str = "NAVEGAR_BACKEND_URL";
pub const ENV_BACKEND_ANON_KEY: &str = "NAVEGAR_BACKEND_ANON_KEY";
pub const ENV_ADDRESS_LOOKUP_URL: &str = "NAVEGAR_ADDRESS_LOOKUP_URL";
pub const ENV_HTTP_TIMEOUT_MS: &str = "NAVEGAR_HTTP_TIMEOUT_MS";
pub const ENV_LOG: &str = "NAVEGAR_LOG";
pub const ENV_LOG_FORMAT: &str = "NAVEGAR_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Main configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavegarConfig {
    pub backend: BackendConfig,
    pub address_lookup: AddressLookupConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLookupConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for AddressLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://viacep.com.br".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `patient=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl NavegarConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get(ENV_BACKEND_URL).ok_or(ConfigError::Missing(ENV_BACKEND_URL))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: ENV_BACKEND_URL,
                reason: "must be an http(s) URL".to_string(),
            });
        }
        let anon_key = get(ENV_BACKEND_ANON_KEY).ok_or(ConfigError::Missing(ENV_BACKEND_ANON_KEY))?;

        let timeout_ms = match get(ENV_HTTP_TIMEOUT_MS) {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: ENV_HTTP_TIMEOUT_MS,
                reason: e.to_string(),
            })?,
            None => 10_000,
        };

        let mut address_lookup = AddressLookupConfig { timeout_ms, ..Default::default() };
        if let Some(base_url) = get(ENV_ADDRESS_LOOKUP_URL) {
            address_lookup.base_url = base_url;
        }

        let mut logging = LoggingConfig::default();
        if let Some(level) = get(ENV_LOG) {
            logging.level = level;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            logging.format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::Invalid {
                        var: ENV_LOG_FORMAT,
                        reason: format!("unknown format '{}'", other),
                    })
                }
            };
        }

        Ok(Self {
            backend: BackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
                timeout_ms,
            },
            address_lookup,
            logging,
        })
    }
}
