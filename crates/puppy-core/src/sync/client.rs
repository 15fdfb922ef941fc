//! Orchestration of load, optimistic create and confirmed delete.

use chrono::Utc;
use uuid::Uuid;

use super::{ClientError, ClientResult, EventMirror, EventsApi, Notice, PendingCreate};
use crate::models::{EventId, EventKind, EventRecord};

/// What happens to an optimistic entry whose create request failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateFailurePolicy {
    /// Keep showing it, marked unconfirmed
    #[default]
    KeepOptimistic,
    /// Remove it again and tell the user
    Rollback,
}

pub struct SyncClient<A> {
    api: A,
    mirror: EventMirror,
    policy: CreateFailurePolicy,
}

impl<A: EventsApi> SyncClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            mirror: EventMirror::new(),
            policy: CreateFailurePolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: CreateFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn mirror(&self) -> &EventMirror {
        &self.mirror
    }

    pub const fn policy(&self) -> CreateFailurePolicy {
        self.policy
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.mirror.drain_notices()
    }

    /// Fetch the log once and replace the mirror with it.
    pub async fn load(&mut self) -> ClientResult<usize> {
        match self.api.list_events().await {
            Ok(events) => {
                self.mirror.replace_all(events);
                tracing::debug!(count = self.mirror.len(), "Loaded events");
                Ok(self.mirror.len())
            }
            Err(error) => {
                tracing::error!(%error, "Error fetching events");
                self.mirror.push_notice(Notice::LoadFailed {
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Show a new event locally. Call [`Self::submit_create`] to send it.
    pub fn begin_create(&mut self, kind: EventKind) -> PendingCreate {
        self.mirror.stage_create(kind, Utc::now())
    }

    /// Send a staged create, or resend one that failed earlier.
    pub async fn submit_create(&mut self, correlation_id: Uuid) -> ClientResult<EventRecord> {
        let record = self
            .mirror
            .pending_create(correlation_id)
            .map(|pending| pending.record.clone())
            .ok_or(ClientError::UnknownIntent(correlation_id))?;

        match self.api.create_event(&record).await {
            Ok(stored) => {
                self.mirror.confirm_create(correlation_id, stored.clone())?;
                tracing::debug!(id = %stored.id, kind = %stored.kind, "Event created");
                Ok(stored)
            }
            Err(error) => {
                tracing::warn!(%error, id = %record.id, kind = %record.kind, "Error adding event");
                let reason = error.to_string();
                match self.policy {
                    CreateFailurePolicy::KeepOptimistic => {
                        self.mirror.mark_create_failed(correlation_id, &reason)?;
                    }
                    CreateFailurePolicy::Rollback => {
                        self.mirror.rollback_create(correlation_id, &reason)?;
                    }
                }
                Err(error)
            }
        }
    }

    /// Stage and send in one step.
    pub async fn create(&mut self, kind: EventKind) -> ClientResult<EventRecord> {
        let pending = self.begin_create(kind);
        self.submit_create(pending.correlation_id).await
    }

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: EventId) -> ClientResult<()> {
        self.mirror.arm_delete(id)
    }

    pub fn cancel_delete(&mut self) -> Option<EventId> {
        self.mirror.disarm_delete()
    }

    /// Delete the armed event. The local copy goes only once the server
    /// has confirmed.
    pub async fn confirm_delete(&mut self) -> ClientResult<EventRecord> {
        let id = self.mirror.disarm_delete().ok_or(ClientError::NoPendingDelete)?;

        match self.api.delete_event(id).await {
            Ok(deleted) => {
                self.mirror.remove(id);
                tracing::debug!(%id, "Event deleted");
                Ok(deleted)
            }
            Err(error) => {
                tracing::warn!(%error, %id, "Error deleting event");
                self.mirror.push_notice(Notice::DeleteFailed {
                    id,
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        events: Mutex<Vec<EventRecord>>,
        fail_list: AtomicBool,
        fail_creates: AtomicBool,
        drop_create_replies: AtomicBool,
        fail_deletes: AtomicBool,
    }

    impl FakeApi {
        fn with_events(events: Vec<EventRecord>) -> Self {
            Self {
                events: Mutex::new(events),
                ..Self::default()
            }
        }

        fn stored_ids(&self) -> Vec<i64> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|record| record.id.value())
                .collect()
        }

        fn unavailable() -> ClientError {
            ClientError::Api {
                status: 503,
                message: "Database connection not available".to_string(),
            }
        }
    }

    impl EventsApi for FakeApi {
        async fn list_events(&self) -> ClientResult<Vec<EventRecord>> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            Ok(self.events.lock().unwrap().clone())
        }

        async fn create_event(&self, record: &EventRecord) -> ClientResult<EventRecord> {
            if self.fail_creates.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            self.events.lock().unwrap().insert(0, record.clone());
            if self.drop_create_replies.load(Ordering::SeqCst) {
                return Err(ClientError::Api {
                    status: 504,
                    message: "Gateway timeout".to_string(),
                });
            }
            Ok(record.clone())
        }

        async fn delete_event(&self, id: EventId) -> ClientResult<EventRecord> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            let mut events = self.events.lock().unwrap();
            let position = events
                .iter()
                .position(|record| record.id == id)
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: "Event not found".to_string(),
                })?;
            Ok(events.remove(position))
        }
    }

    fn seeded() -> Vec<EventRecord> {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        vec![
            EventRecord::new(EventId::new(2), EventKind::Poop, t),
            EventRecord::new(EventId::new(1), EventKind::Pee, t - Duration::minutes(10)),
        ]
    }

    #[tokio::test]
    async fn load_populates_mirror() {
        let mut client = SyncClient::new(FakeApi::with_events(seeded()));
        assert_eq!(client.load().await.unwrap(), 2);
        assert_eq!(client.mirror().events(), seeded().as_slice());
    }

    #[tokio::test]
    async fn failed_load_leaves_mirror_empty_with_notice() {
        let api = FakeApi::with_events(seeded());
        api.fail_list.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api);

        assert!(client.load().await.is_err());
        assert!(client.mirror().is_empty());
        assert!(matches!(
            client.drain_notices().as_slice(),
            [Notice::LoadFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn create_confirms_and_clears_intent() {
        let mut client = SyncClient::new(FakeApi::default());
        let created = client.create(EventKind::Water).await.unwrap();

        assert_eq!(client.mirror().events(), &[created.clone()]);
        assert!(client.mirror().pending_creates().is_empty());
        assert_eq!(client.api().stored_ids(), vec![created.id.value()]);
    }

    #[tokio::test]
    async fn begin_create_shows_entry_before_request() {
        let mut client = SyncClient::new(FakeApi::with_events(seeded()));
        client.load().await.unwrap();

        let pending = client.begin_create(EventKind::Food);
        assert_eq!(client.mirror().events()[0], pending.record);
        assert!(client.api().stored_ids().iter().all(|id| *id != pending.record.id.value()));

        client.submit_create(pending.correlation_id).await.unwrap();
        assert!(client.api().stored_ids().contains(&pending.record.id.value()));
    }

    #[tokio::test]
    async fn rapid_creates_get_distinct_ids() {
        let mut client = SyncClient::new(FakeApi::default());
        let first = client.create(EventKind::Pee).await.unwrap();
        let second = client.create(EventKind::Pee).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn failed_create_keeps_optimistic_entry_by_default() {
        let api = FakeApi::default();
        api.fail_creates.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api);

        let error = client.create(EventKind::Poop).await.unwrap_err();
        assert_eq!(error.status(), Some(503));
        assert_eq!(client.mirror().len(), 1);
        assert_eq!(client.mirror().pending_creates().len(), 1);
        assert!(client.api().stored_ids().is_empty());
        assert!(matches!(
            client.drain_notices().as_slice(),
            [Notice::CreateFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn failed_create_can_be_retried() {
        let api = FakeApi::default();
        api.fail_creates.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api);

        let pending = client.begin_create(EventKind::Food);
        assert!(client.submit_create(pending.correlation_id).await.is_err());

        client.api().fail_creates.store(false, Ordering::SeqCst);
        let stored = client.submit_create(pending.correlation_id).await.unwrap();
        assert_eq!(stored, pending.record);
        assert!(client.mirror().pending_creates().is_empty());
        assert_eq!(client.mirror().len(), 1);
    }

    #[tokio::test]
    async fn deleting_unacknowledged_create_drops_its_intent() {
        let api = FakeApi::default();
        api.drop_create_replies.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api);

        let pending = client.begin_create(EventKind::Poop);
        assert!(client.submit_create(pending.correlation_id).await.is_err());
        assert_eq!(client.api().stored_ids(), vec![pending.record.id.value()]);

        client.request_delete(pending.record.id).unwrap();
        client.confirm_delete().await.unwrap();
        assert!(client.mirror().is_empty());
        assert!(client.mirror().pending_creates().is_empty());

        client.api().drop_create_replies.store(false, Ordering::SeqCst);
        assert!(matches!(
            client.submit_create(pending.correlation_id).await,
            Err(ClientError::UnknownIntent(_))
        ));
        assert!(client.mirror().is_empty());
        assert!(client.api().stored_ids().is_empty());
    }

    #[tokio::test]
    async fn failed_create_rolls_back_when_selected() {
        let api = FakeApi::with_events(seeded());
        api.fail_creates.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api).with_policy(CreateFailurePolicy::Rollback);
        client.load().await.unwrap();

        assert!(client.create(EventKind::Water).await.is_err());
        assert_eq!(client.mirror().events(), seeded().as_slice());
        assert!(client.mirror().pending_creates().is_empty());
        assert!(matches!(
            client.drain_notices().as_slice(),
            [Notice::CreateRolledBack { .. }]
        ));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let mut client = SyncClient::new(FakeApi::with_events(seeded()));
        client.load().await.unwrap();

        assert!(matches!(
            client.confirm_delete().await,
            Err(ClientError::NoPendingDelete)
        ));

        client.request_delete(EventId::new(2)).unwrap();
        assert_eq!(client.cancel_delete(), Some(EventId::new(2)));
        assert!(matches!(
            client.confirm_delete().await,
            Err(ClientError::NoPendingDelete)
        ));
        assert_eq!(client.mirror().len(), 2);
        assert_eq!(client.api().stored_ids(), vec![2, 1]);
    }

    #[tokio::test]
    async fn confirmed_delete_removes_after_server_ack() {
        let mut client = SyncClient::new(FakeApi::with_events(seeded()));
        client.load().await.unwrap();

        client.request_delete(EventId::new(2)).unwrap();
        let deleted = client.confirm_delete().await.unwrap();
        assert_eq!(deleted.id, EventId::new(2));
        assert!(!client.mirror().contains(EventId::new(2)));
        assert_eq!(client.api().stored_ids(), vec![1]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_entry_and_disarms() {
        let api = FakeApi::with_events(seeded());
        api.fail_deletes.store(true, Ordering::SeqCst);
        let mut client = SyncClient::new(api);
        client.load().await.unwrap();

        client.request_delete(EventId::new(1)).unwrap();
        assert!(client.confirm_delete().await.is_err());
        assert!(client.mirror().contains(EventId::new(1)));
        assert_eq!(client.mirror().armed_delete(), None);
        assert!(matches!(
            client.drain_notices().as_slice(),
            [Notice::DeleteFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn request_delete_of_unknown_id_fails_locally() {
        let mut client = SyncClient::new(FakeApi::with_events(seeded()));
        client.load().await.unwrap();
        assert!(matches!(
            client.request_delete(EventId::new(42)),
            Err(ClientError::NotMirrored(_))
        ));
    }
}
