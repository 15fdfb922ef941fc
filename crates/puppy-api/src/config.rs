use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use puppy_core::db::DatabaseConfig;
use puppy_core::util::mask_credentials;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &mask_credentials(&self.database_url))
            .field(
                "database_auth_token",
                &self.database_auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("reconnect_delay", &self.reconnect_delay)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = value_or_default(&lookup, "PORT", "3001")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::Invalid("PORT must be an integer in [0, 65535]".to_string())
            })?;
        let bind_host = value_or_default(&lookup, "PUPPY_API_BIND_HOST", "0.0.0.0");
        let bind_addr = format!("{bind_host}:{port}");

        let database_url = value_or_default(&lookup, "DATABASE_URL", "puppy-tracker.db");
        let database_auth_token = optional_trimmed(&lookup, "DATABASE_AUTH_TOKEN");
        if database_url.starts_with("libsql://") && database_auth_token.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_AUTH_TOKEN"));
        }

        let reconnect_delay_secs = bounded_secs(&lookup, "DATABASE_RECONNECT_DELAY_SECS", 5)?;
        let heartbeat_secs = bounded_secs(&lookup, "DATABASE_HEARTBEAT_SECS", 5)?;

        Ok(Self {
            bind_addr,
            database_url,
            database_auth_token,
            reconnect_delay: Duration::from_secs(reconnect_delay_secs),
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
        })
    }

    pub fn database_config(&self) -> DatabaseConfig {
        let config = DatabaseConfig::new(self.database_url.clone())
            .with_reconnect_delay(self.reconnect_delay)
            .with_heartbeat_interval(self.heartbeat_interval);
        match &self.database_auth_token {
            Some(token) => config.with_auth_token(token.clone()),
            None => config,
        }
    }
}

fn bounded_secs(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let secs = value_or_default(&lookup, name, &default.to_string())
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be an integer in [1, 300]")))?;
    if !(1..=300).contains(&secs) {
        return Err(ConfigError::Invalid(format!("{name} must be in [1, 300]")));
    }
    Ok(secs)
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
