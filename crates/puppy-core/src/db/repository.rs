//! Event store implementation

use std::sync::Arc;

use libsql::{params, Connection};

use super::ConnectionManager;
use crate::error::{Error, Result};
use crate::models::{EventId, EventKind, EventRecord};

/// Trait for event storage operations (async)
///
/// There is deliberately no update: a wrong entry is deleted and recreated.
#[allow(async_fn_in_trait)]
pub trait EventRepository {
    /// All events, newest first. Empty while the store is unavailable.
    async fn list_all(&self) -> Result<Vec<EventRecord>>;

    /// Persist a new event and return it as stored
    async fn create(&self, record: &EventRecord) -> Result<EventRecord>;

    /// Remove the event with this id and return it
    async fn delete_by_id(&self, id: EventId) -> Result<EventRecord>;
}

/// libSQL implementation of `EventRepository`, gated on connectivity
#[derive(Clone)]
pub struct EventStore {
    manager: Arc<ConnectionManager>,
}

impl EventStore {
    pub const fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub const fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    async fn connection(&self) -> Result<Connection> {
        self.manager.connection().await.ok_or(Error::Unavailable)
    }

    /// Turn driver errors that mean "the connection is gone" into
    /// `Unavailable`, telling the manager on the way.
    async fn classify(&self, error: libsql::Error) -> Error {
        if is_connection_error(&error) {
            self.manager.report_disconnect(&error.to_string()).await;
            Error::Unavailable
        } else {
            Error::LibSql(error)
        }
    }

    /// Parse an event from a `id, type, timestamp` row
    fn parse_event(row: &libsql::Row) -> Result<EventRecord> {
        let id: i64 = row.get(0)?;
        let kind: String = row.get(1)?;
        let timestamp_ms: i64 = row.get(2)?;

        let kind = kind
            .parse::<EventKind>()
            .map_err(|_| Error::Database(format!("stored event {id} has unknown type '{kind}'")))?;
        EventRecord::from_millis(EventId::new(id), kind, timestamp_ms)
    }

    async fn query_all(&self) -> Result<Vec<EventRecord>> {
        let conn = self.connection().await?;
        let rows = match conn
            .query(
                "SELECT id, type, timestamp FROM puppy_events ORDER BY timestamp DESC, id DESC",
                (),
            )
            .await
        {
            Ok(rows) => rows,
            Err(error) => return Err(self.classify(error).await),
        };
        self.collect_events(rows).await
    }

    async fn collect_events(&self, mut rows: libsql::Rows) -> Result<Vec<EventRecord>> {
        let mut events = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => events.push(Self::parse_event(&row)?),
                Ok(None) => break,
                Err(error) => return Err(self.classify(error).await),
            }
        }
        Ok(events)
    }
}

impl EventRepository for EventStore {
    async fn list_all(&self) -> Result<Vec<EventRecord>> {
        match self.query_all().await {
            Err(Error::Unavailable) => {
                tracing::info!("Database not connected - returning empty event list");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn create(&self, record: &EventRecord) -> Result<EventRecord> {
        record.validate()?;
        let conn = self.connection().await?;
        let stored = EventRecord::new(record.id, record.kind, record.timestamp);

        let inserted = conn
            .execute(
                "INSERT INTO puppy_events (id, type, timestamp) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    stored.id.value(),
                    stored.kind.as_str(),
                    stored.timestamp_millis()
                ],
            )
            .await;

        match inserted {
            Ok(0) => Err(Error::Conflict(stored.id)),
            Ok(_) => {
                tracing::debug!(id = %stored.id, kind = %stored.kind, "Stored event");
                Ok(stored)
            }
            Err(error) => Err(self.classify(error).await),
        }
    }

    async fn delete_by_id(&self, id: EventId) -> Result<EventRecord> {
        let conn = self.connection().await?;

        let rows = match conn
            .query(
                "DELETE FROM puppy_events WHERE id = ?1 RETURNING id, type, timestamp",
                params![id.value()],
            )
            .await
        {
            Ok(rows) => rows,
            Err(error) => return Err(self.classify(error).await),
        };

        let deleted = self.collect_events(rows).await?;
        deleted.into_iter().next().ok_or(Error::NotFound(id))
    }
}

fn is_connection_error(error: &libsql::Error) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    [
        "connection",
        "hrana",
        "stream",
        "timed out",
        "broken pipe",
        "network",
        "unreachable",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}
