//! Client-side synchronization with the events API.
//!
//! [`EventMirror`] is the local, possibly stale copy of the log plus the
//! user's in-flight intents. [`SyncClient`] drives it against any
//! [`EventsApi`], normally [`HttpEventsApi`].

mod client;
mod http;
mod mirror;

use thiserror::Error;

use crate::models::{EventId, EventRecord};

pub use client::{CreateFailurePolicy, SyncClient};
pub use http::HttpEventsApi;
pub use mirror::{EventMirror, Notice, PendingCreate};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Event {0} is not in the local event list")]
    NotMirrored(EventId),
    #[error("No delete is waiting for confirmation")]
    NoPendingDelete,
    #[error("No pending create with correlation id {0}")]
    UnknownIntent(uuid::Uuid),
}

impl ClientError {
    /// HTTP status of an API rejection, if this is one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Remote surface of the event log.
#[allow(async_fn_in_trait)]
pub trait EventsApi {
    /// Full log, newest first
    async fn list_events(&self) -> ClientResult<Vec<EventRecord>>;

    /// Send a client-built record; returns the stored copy
    async fn create_event(&self, record: &EventRecord) -> ClientResult<EventRecord>;

    /// Delete by client id; returns the removed record
    async fn delete_event(&self, id: EventId) -> ClientResult<EventRecord>;
}
