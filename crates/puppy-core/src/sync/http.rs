//! reqwest implementation of [`EventsApi`].

use reqwest::StatusCode;
use serde::Deserialize;

use super::{ClientError, ClientResult, EventsApi};
use crate::config::ClientConfig;
use crate::models::{EventId, EventRecord};
use crate::util::compact_text;

const EVENTS_PATH: &str = "/api/events";

#[derive(Clone)]
pub struct HttpEventsApi {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpEventsApi {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { config, client })
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn events_url(&self) -> String {
        self.config.endpoint(EVENTS_PATH)
    }

    fn event_url(&self, id: EventId) -> String {
        self.config.endpoint(&format!("{EVENTS_PATH}/{id}"))
    }
}

impl EventsApi for HttpEventsApi {
    async fn list_events(&self) -> ClientResult<Vec<EventRecord>> {
        let response = self
            .client
            .get(self.events_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }

    async fn create_event(&self, record: &EventRecord) -> ClientResult<EventRecord> {
        let response = self
            .client
            .post(self.events_url())
            .json(record)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_event(&self, id: EventId) -> ClientResult<EventRecord> {
        let response = self.client.delete(self.event_url(id)).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        });
    }
    Ok(response.json::<T>().await?)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        match (payload.message, payload.error) {
            (Some(message), Some(error)) if !error.trim().is_empty() => {
                return format!("{}: {}", message.trim(), compact_text(&error));
            }
            (Some(message), _) | (None, Some(message)) => return message.trim().to_string(),
            (None, None) => {}
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
    } else {
        trimmed
    }
}
