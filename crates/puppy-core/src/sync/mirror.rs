//! Local copy of the event log and the intents layered on top of it.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ClientError, ClientResult};
use crate::analytics::{self, KindSummary};
use crate::models::{EventFilter, EventId, EventKind, EventRecord};

/// A create shown locally but not yet acknowledged by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreate {
    pub correlation_id: Uuid,
    pub record: EventRecord,
    /// Last failure, if the request was already attempted
    pub last_error: Option<String>,
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoadFailed { reason: String },
    CreateFailed { record: EventRecord, reason: String },
    CreateRolledBack { record: EventRecord, reason: String },
    DeleteFailed { id: EventId, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { reason } => write!(f, "Could not load events: {reason}"),
            Self::CreateFailed { record, reason } => write!(
                f,
                "{} event {} was not saved and is shown unconfirmed: {reason}",
                record.kind.label(),
                record.id
            ),
            Self::CreateRolledBack { record, reason } => write!(
                f,
                "{} event {} was not saved and has been removed: {reason}",
                record.kind.label(),
                record.id
            ),
            Self::DeleteFailed { id, reason } => {
                write!(f, "Event {id} was not deleted: {reason}")
            }
        }
    }
}

/// Newest-first event list plus pending intents. No I/O.
#[derive(Debug, Default)]
pub struct EventMirror {
    events: Vec<EventRecord>,
    pending: Vec<PendingCreate>,
    armed_delete: Option<EventId>,
    notices: VecDeque<Notice>,
    last_issued_id: i64,
}

impl EventMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list with a server snapshot.
    pub fn replace_all(&mut self, mut events: Vec<EventRecord>) {
        sort_newest_first(&mut events);
        self.events = events;
        if let Some(id) = self.armed_delete {
            if !self.contains(id) {
                self.armed_delete = None;
            }
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.iter().any(|record| record.id == id)
    }

    pub fn get(&self, id: EventId) -> Option<&EventRecord> {
        self.events.iter().find(|record| record.id == id)
    }

    pub fn filtered(&self, filter: EventFilter) -> Vec<EventRecord> {
        analytics::filter_events(&self.events, filter)
    }

    pub fn summaries(&self) -> Vec<KindSummary> {
        analytics::summarize(&self.events)
    }

    /// Next client id: the current millisecond, bumped past the last one
    /// issued so two creates in the same millisecond still differ.
    pub fn next_id(&mut self, now_ms: i64) -> EventId {
        let id = now_ms.max(self.last_issued_id + 1);
        self.last_issued_id = id;
        EventId::new(id)
    }

    /// Build a record for `kind` at `now`, show it, and track the intent.
    pub fn stage_create(&mut self, kind: EventKind, now: DateTime<Utc>) -> PendingCreate {
        let id = self.next_id(now.timestamp_millis());
        let record = EventRecord::new(id, kind, now);
        let pending = PendingCreate {
            correlation_id: Uuid::now_v7(),
            record: record.clone(),
            last_error: None,
        };
        self.insert(record);
        self.pending.push(pending.clone());
        pending
    }

    pub fn pending_creates(&self) -> &[PendingCreate] {
        &self.pending
    }

    pub fn pending_create(&self, correlation_id: Uuid) -> Option<&PendingCreate> {
        self.pending
            .iter()
            .find(|pending| pending.correlation_id == correlation_id)
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.pending.iter().any(|pending| pending.record.id == id)
    }

    /// Server acknowledged the create; replace the local copy with the
    /// stored one.
    pub fn confirm_create(
        &mut self,
        correlation_id: Uuid,
        stored: EventRecord,
    ) -> ClientResult<()> {
        let pending = self.take_pending(correlation_id)?;
        self.remove(pending.record.id);
        self.insert(stored);
        Ok(())
    }

    /// Leave the optimistic entry visible and remember why it failed.
    pub fn mark_create_failed(&mut self, correlation_id: Uuid, reason: &str) -> ClientResult<()> {
        let pending = self
            .pending
            .iter_mut()
            .find(|pending| pending.correlation_id == correlation_id)
            .ok_or(ClientError::UnknownIntent(correlation_id))?;
        pending.last_error = Some(reason.to_string());
        let record = pending.record.clone();
        self.notices.push_back(Notice::CreateFailed {
            record,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Undo an optimistic create.
    pub fn rollback_create(
        &mut self,
        correlation_id: Uuid,
        reason: &str,
    ) -> ClientResult<EventRecord> {
        let pending = self.take_pending(correlation_id)?;
        self.remove(pending.record.id);
        self.notices.push_back(Notice::CreateRolledBack {
            record: pending.record.clone(),
            reason: reason.to_string(),
        });
        Ok(pending.record)
    }

    /// Arm the delete confirmation for a mirrored event.
    pub fn arm_delete(&mut self, id: EventId) -> ClientResult<()> {
        if !self.contains(id) {
            return Err(ClientError::NotMirrored(id));
        }
        self.armed_delete = Some(id);
        Ok(())
    }

    pub fn disarm_delete(&mut self) -> Option<EventId> {
        self.armed_delete.take()
    }

    pub const fn armed_delete(&self) -> Option<EventId> {
        self.armed_delete
    }

    /// Drop an event from the list. Also clears any intent referring to it.
    pub fn remove(&mut self, id: EventId) -> Option<EventRecord> {
        self.pending.retain(|pending| pending.record.id != id);
        let position = self.events.iter().position(|record| record.id == id)?;
        if self.armed_delete == Some(id) {
            self.armed_delete = None;
        }
        Some(self.events.remove(position))
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn take_pending(&mut self, correlation_id: Uuid) -> ClientResult<PendingCreate> {
        let position = self
            .pending
            .iter()
            .position(|pending| pending.correlation_id == correlation_id)
            .ok_or(ClientError::UnknownIntent(correlation_id))?;
        Ok(self.pending.remove(position))
    }

    fn insert(&mut self, record: EventRecord) {
        let position = self
            .events
            .partition_point(|existing| is_newer(existing, &record));
        self.events.insert(position, record);
    }
}

fn is_newer(a: &EventRecord, b: &EventRecord) -> bool {
    (a.timestamp, a.id) > (b.timestamp, b.id)
}

fn sort_newest_first(events: &mut [EventRecord]) {
    events.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
}
