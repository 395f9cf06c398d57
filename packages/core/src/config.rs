use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::db::DEFAULT_MAX_CONNECTIONS;

const DEFAULT_DATABASE_URL: &str = "sqlite://iot_platform.db";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub max_connections: u32,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key → value source. Unset or empty keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_address =
            get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_positive::<u32>("DB_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let timeout_seconds = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => parse_positive::<u64>("REQUEST_TIMEOUT_SECONDS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        Ok(Self {
            database_url,
            bind_address,
            max_connections,
            request_timeout: Duration::from_secs(timeout_seconds),
        })
    }

    /// Command-line flags win over the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(bind) = &cli.bind {
            self.bind_address = bind.clone();
        }
        if let Some(max) = cli.max_connections {
            self.max_connections = max;
        }
        if let Some(secs) = cli.request_timeout {
            self.request_timeout = Duration::from_secs(secs);
        }
        self
    }
}

fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|v| *v > T::default())
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}
