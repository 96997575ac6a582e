//! Application configuration read from a bundled properties asset.
//!
//! # Responsibility
//! - Map `xbase.properties` keys onto typed settings with defaults.
//! - Validate endpoints, timeout and log level before any screen runs.
//!
//! # Invariants
//! - A missing config asset is not an error; defaults apply.
//! - A present but invalid value is always an error, never silently replaced.

use crate::asset::{AssetError, AssetReader, Properties};
use crate::logging::{default_log_level, normalize_level, LogSettings};
use log::info;
use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Default config asset path.
pub const CONFIG_ASSET_PATH: &str = "xbase.properties";

pub const KEY_GOODS_TYPE_ENDPOINT: &str = "endpoint.goods_type";
pub const KEY_LEAVE_MESSAGE_ENDPOINT: &str = "endpoint.leave_message";
pub const KEY_HTTP_TIMEOUT_MS: &str = "http.timeout_ms";
pub const KEY_LOG_LEVEL: &str = "log.level";

pub const DEFAULT_GOODS_TYPE_ENDPOINT: &str = "http://shuiguorili.com:8080/goodstype";
pub const DEFAULT_LEAVE_MESSAGE_ENDPOINT: &str = "http://shuiguorili.com:8080/leavemessage";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15_000;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Asset(AssetError),
    InvalidUrl { key: &'static str, value: String },
    InvalidTimeout(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asset(err) => write!(f, "{err}"),
            Self::InvalidUrl { key, value } => {
                write!(f, "`{key}` must be an absolute http(s) URL, got `{value}`")
            }
            Self::InvalidTimeout(value) => write!(
                f,
                "`{KEY_HTTP_TIMEOUT_MS}` must be a positive integer, got `{value}`"
            ),
            Self::InvalidLogLevel(message) => write!(f, "`{KEY_LOG_LEVEL}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Asset(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AssetError> for ConfigError {
    fn from(value: AssetError) -> Self {
        Self::Asset(value)
    }
}

/// Validated application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub goods_type_endpoint: String,
    pub leave_message_endpoint: String,
    pub http_timeout: Duration,
    pub log_level: &'static str,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            goods_type_endpoint: DEFAULT_GOODS_TYPE_ENDPOINT.to_string(),
            leave_message_endpoint: DEFAULT_LEAVE_MESSAGE_ENDPOINT.to_string(),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Builds settings from parsed properties; absent keys use defaults.
    pub fn from_properties(properties: &Properties) -> ConfigResult<Self> {
        let defaults = Self::default();

        let goods_type_endpoint = match properties.get(KEY_GOODS_TYPE_ENDPOINT) {
            Some(value) => validate_url(KEY_GOODS_TYPE_ENDPOINT, value)?,
            None => defaults.goods_type_endpoint,
        };
        let leave_message_endpoint = match properties.get(KEY_LEAVE_MESSAGE_ENDPOINT) {
            Some(value) => validate_url(KEY_LEAVE_MESSAGE_ENDPOINT, value)?,
            None => defaults.leave_message_endpoint,
        };
        let http_timeout = match properties.get(KEY_HTTP_TIMEOUT_MS) {
            Some(value) => parse_timeout(value)?,
            None => defaults.http_timeout,
        };
        let log_level = match properties.get(KEY_LOG_LEVEL) {
            Some(value) => normalize_level(value).map_err(ConfigError::InvalidLogLevel)?,
            None => defaults.log_level,
        };

        Ok(Self {
            goods_type_endpoint,
            leave_message_endpoint,
            http_timeout,
            log_level,
        })
    }

    /// Reads and validates the config asset at `path`.
    pub fn load(reader: &AssetReader, path: &str) -> ConfigResult<Self> {
        let properties = reader.read_config(path)?;
        Self::from_properties(&properties)
    }

    /// Like [`AppConfig::load`], but a missing asset yields defaults.
    pub fn load_or_default(reader: &AssetReader, path: &str) -> ConfigResult<Self> {
        match Self::load(reader, path) {
            Err(ConfigError::Asset(err)) if err.is_not_found() => {
                info!(
                    "event=config_load module=config status=default path={}",
                    path
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Logging settings at the configured `log.level`, writing under `log_dir`.
    pub fn log_settings(&self, log_dir: impl Into<PathBuf>) -> LogSettings {
        LogSettings::new(self.log_level, log_dir)
    }
}

fn validate_url(key: &'static str, raw: &str) -> ConfigResult<String> {
    let value = raw.trim();
    let invalid = || ConfigError::InvalidUrl {
        key,
        value: raw.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(value.to_string())
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
