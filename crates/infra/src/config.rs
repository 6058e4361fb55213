//! Process configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use identity_observability::LogFormat;

use crate::accounts::StoreTimeouts;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
/// Development-only signing key, used when `JWT_SECRET_KEY` is unset.
pub const DEV_SIGNING_KEY: &str = "secret";
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("JWT_SECRET_KEY must not be empty")]
    EmptySigningKey,
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub signing_key: String,
    pub bcrypt_cost: u32,
    pub store_timeouts: StoreTimeouts,
    pub log_format: LogFormat,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("signing_key", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("store_timeouts", &self.store_timeouts)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            signing_key: DEV_SIGNING_KEY.to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            store_timeouts: StoreTimeouts::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let signing_key = match lookup("JWT_SECRET_KEY") {
            Some(key) if key.is_empty() => return Err(ConfigError::EmptySigningKey),
            Some(key) => key,
            None => {
                tracing::warn!("JWT_SECRET_KEY not set; using insecure dev default");
                defaults.signing_key
            }
        };

        let read = defaults.store_timeouts.read;
        let write = defaults.store_timeouts.write;
        let store_timeouts = StoreTimeouts {
            read: parse_or(&lookup, "STORE_READ_TIMEOUT_MS", read, parse_millis)?,
            write: parse_or(&lookup, "STORE_WRITE_TIMEOUT_MS", write, parse_millis)?,
        };

        Ok(Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port, |v| {
                v.parse::<u16>().map_err(|e| e.to_string())
            })?,
            signing_key,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost, |v| {
                v.parse::<u32>().map_err(|e| e.to_string())
            })?,
            store_timeouts,
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format, |v| {
                v.parse::<LogFormat>().map_err(|e| e.to_string())
            })?,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => parse(raw.trim()).map_err(|reason| ConfigError::invalid(key, &raw, reason)),
    }
}

fn parse_millis(raw: &str) -> Result<Duration, String> {
    match raw.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".into()),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(e.to_string()),
    }
}
