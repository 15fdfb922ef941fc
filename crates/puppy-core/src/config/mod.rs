//! Client configuration.
//!
//! Tells the CLI and any other client where the events API lives.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::ClientError;
use crate::util::{is_http_url, normalize_text_option};

/// Environment variable that overrides the compiled-in API origin.
pub const API_BASE_URL_ENV: &str = "PUPPY_API_BASE_URL";

/// Local server started with `puppy-api` defaults.
pub const DEVELOPMENT_API_BASE_URL: &str = "http://127.0.0.1:3001";

/// Deployed production origin.
pub const PRODUCTION_API_BASE_URL: &str = "https://puppy-tracker-teal.vercel.app";

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the events API, without a trailing slash
    pub api_base_url: String,
    /// Per-request timeout. `None` leaves it to the transport.
    #[serde(default, with = "timeout_secs")]
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url().to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Resolve from the process environment, with an optional explicit override
    /// (e.g. a `--api-url` flag) taking precedence.
    pub fn resolve(explicit: Option<String>) -> Result<Self, ClientError> {
        Self::from_lookup(explicit, |key| std::env::var(key).ok())
    }

    /// Resolve with a custom lookup instead of the process environment.
    pub fn from_lookup(
        explicit: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClientError> {
        let chosen = normalize_text_option(explicit)
            .or_else(|| normalize_text_option(lookup(API_BASE_URL_ENV)));

        let api_base_url = match chosen {
            Some(url) => normalize_base_url(&url)?,
            None => default_api_base_url().to_string(),
        };

        Ok(Self {
            api_base_url,
            ..Self::default()
        })
    }

    /// Full URL for an API path such as `/api/events`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

/// Compiled-in origin: the local server in debug builds, production otherwise.
pub const fn default_api_base_url() -> &'static str {
    if cfg!(debug_assertions) {
        DEVELOPMENT_API_BASE_URL
    } else {
        PRODUCTION_API_BASE_URL
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let value = raw.trim();
    if !is_http_url(value) {
        return Err(ClientError::InvalidConfiguration(format!(
            "API base URL must include http:// or https://, got '{value}'"
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&value.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
    }
}
