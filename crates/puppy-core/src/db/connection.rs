//! Database connection management
//!
//! [`ConnectionManager`] owns the single shared libSQL connection. It never
//! fails loudly: a failed connect leaves the manager in
//! [`ConnectionState::Disconnected`] and the supervisor task keeps retrying
//! on a fixed delay until the database comes back.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use libsql::{Builder, Connection, Database as LibSqlDatabase};
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;

use super::migrations;
use crate::error::Result;
use crate::state::ConnectionState;
use crate::util::mask_credentials;

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default interval between liveness probes of an established connection.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Where the events live and how hard to try to reach them
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Local file path, `:memory:`, or a remote `libsql://` / `https://` URL
    pub url: String,
    /// Authentication token for remote databases
    pub auth_token: Option<String>,
    /// Fixed delay before each reconnection attempt
    pub reconnect_delay: Duration,
    /// How often an established connection is probed
    pub heartbeat_interval: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// In-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Whether the URL points at a remote libSQL server rather than a file.
    pub fn is_remote(&self) -> bool {
        ["libsql://", "http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseConfig")
            .field("url", &mask_credentials(&self.url))
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("reconnect_delay", &self.reconnect_delay)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish()
    }
}

struct LiveConnection {
    _db: LibSqlDatabase,
    conn: Connection,
}

/// Owner of the shared connection and its availability signal.
pub struct ConnectionManager {
    config: DatabaseConfig,
    live: RwLock<Option<LiveConnection>>,
    state_tx: watch::Sender<ConnectionState>,
    lost: Notify,
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state. Call [`Self::connect`]
    /// or [`Self::spawn_supervisor`] to bring it up.
    pub fn new(config: DatabaseConfig) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            config,
            live: RwLock::new(None),
            state_tx,
            lost: Notify::new(),
        })
    }

    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn is_available(&self) -> bool {
        self.state().is_available()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Try to open the database once.
    ///
    /// Returns whether the connection is now live. Failures are logged and
    /// leave the manager `Disconnected`; they are never returned.
    pub async fn connect(&self) -> bool {
        self.state_tx.send_replace(ConnectionState::Connecting);
        tracing::info!(
            url = %mask_credentials(&self.config.url),
            remote = self.config.is_remote(),
            "Attempting to connect to database"
        );

        match open(&self.config).await {
            Ok(live) => {
                *self.live.write().await = Some(live);
                self.state_tx.send_replace(ConnectionState::Connected);
                tracing::info!("Successfully connected to database");
                true
            }
            Err(error) => {
                *self.live.write().await = None;
                self.state_tx.send_replace(ConnectionState::Disconnected);
                tracing::error!(%error, "Database connection error");
                false
            }
        }
    }

    /// Handle to the shared connection, or `None` while unavailable.
    pub async fn connection(&self) -> Option<Connection> {
        if !self.is_available() {
            return None;
        }
        self.live.read().await.as_ref().map(|live| live.conn.clone())
    }

    /// Signal that the connection dropped out from under an operation.
    ///
    /// Availability flips to `false` immediately; the supervisor schedules the
    /// reconnect.
    pub async fn report_disconnect(&self, reason: &str) {
        if !self.is_available() {
            return;
        }
        self.mark_disconnected(reason).await;
        self.lost.notify_one();
    }

    async fn mark_disconnected(&self, reason: &str) {
        self.state_tx.send_replace(ConnectionState::Disconnected);
        *self.live.write().await = None;
        tracing::warn!(
            reason,
            retry_in = ?self.config.reconnect_delay,
            "Database disconnected! Attempting to reconnect..."
        );
    }

    /// Liveness check. Reads the schema table so a wiped database counts as
    /// lost too.
    async fn probe(&self) -> bool {
        let Some(conn) = self.connection().await else {
            return false;
        };
        match conn.query("SELECT 1 FROM schema_version LIMIT 1", ()).await {
            Ok(mut rows) => rows.next().await.is_ok(),
            Err(error) => {
                tracing::debug!(%error, "Database heartbeat failed");
                false
            }
        }
    }

    /// Spawn the background task that keeps the connection alive.
    ///
    /// The task connects if needed, probes a live connection every heartbeat
    /// interval, and after any disconnect waits the fixed reconnect delay
    /// before trying again. It runs until aborted.
    pub fn spawn_supervisor(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.supervise().await })
    }

    async fn supervise(self: Arc<Self>) {
        if !self.is_available() {
            self.connect().await;
        }

        loop {
            if self.is_available() {
                tokio::select! {
                    () = self.lost.notified() => {
                        if self.is_available() {
                            continue;
                        }
                    }
                    () = tokio::time::sleep(self.config.heartbeat_interval) => {
                        if self.probe().await {
                            continue;
                        }
                        if self.is_available() {
                            self.mark_disconnected("heartbeat probe failed").await;
                        }
                    }
                }
            }

            tokio::time::sleep(self.config.reconnect_delay).await;
            self.connect().await;
        }
    }
}

async fn open(config: &DatabaseConfig) -> Result<LiveConnection> {
    let db = if config.is_remote() {
        let token = config.auth_token.clone().unwrap_or_default();
        Builder::new_remote(config.url.clone(), token).build().await?
    } else {
        let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
        Builder::new_local(path).build().await?
    };
    let conn = db.connect()?;
    migrations::run(&conn).await?;
    Ok(LiveConnection { _db: db, conn })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn wait_for_state(manager: &ConnectionManager, wanted: ConnectionState) {
        let mut rx = manager.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|state| *state == wanted))
            .await
            .expect("state change timed out")
            .expect("manager dropped");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_in_memory_sets_available() {
        let manager = ConnectionManager::new(DatabaseConfig::in_memory());
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        assert!(manager.connect().await);
        assert!(manager.is_available());
        assert!(manager.connection().await.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_failure_is_not_raised() {
        let tmp = tempdir().unwrap();
        let unreachable = tmp.path().join("missing").join("nested").join("puppy.db");
        let manager = ConnectionManager::new(DatabaseConfig::new(
            unreachable.to_string_lossy().to_string(),
        ));

        assert!(!manager.connect().await);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.connection().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reported_disconnect_flips_immediately_and_reconnects() {
        let config = DatabaseConfig::in_memory()
            .with_reconnect_delay(Duration::from_millis(20))
            .with_heartbeat_interval(Duration::from_secs(60));
        let manager = ConnectionManager::new(config);
        let supervisor = manager.spawn_supervisor();
        wait_for_state(&manager, ConnectionState::Connected).await;

        manager.report_disconnect("test").await;
        assert!(!manager.is_available());
        assert!(manager.connection().await.is_none());

        wait_for_state(&manager, ConnectionState::Connected).await;
        assert!(manager.is_available());
        supervisor.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn heartbeat_detects_lost_database_and_reconnects() {
        let tmp = tempdir().unwrap();
        let config = DatabaseConfig::new(tmp.path().join("puppy.db").to_string_lossy().to_string())
            .with_reconnect_delay(Duration::from_millis(300))
            .with_heartbeat_interval(Duration::from_millis(20));
        let manager = ConnectionManager::new(config);
        let supervisor = manager.spawn_supervisor();
        wait_for_state(&manager, ConnectionState::Connected).await;

        let conn = manager.connection().await.unwrap();
        conn.execute("DROP TABLE schema_version", ()).await.unwrap();
        drop(conn);

        wait_for_state(&manager, ConnectionState::Disconnected).await;
        assert!(manager.connection().await.is_none());

        wait_for_state(&manager, ConnectionState::Connected).await;
        assert!(manager.probe().await);
        supervisor.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn supervisor_keeps_retrying_failed_connect() {
        let tmp = tempdir().unwrap();
        let db_dir = tmp.path().join("later");
        let db_path = db_dir.join("puppy.db");
        let config = DatabaseConfig::new(db_path.to_string_lossy().to_string())
            .with_reconnect_delay(Duration::from_millis(20));
        let manager = ConnectionManager::new(config);
        let supervisor = manager.spawn_supervisor();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!manager.is_available());

        std::fs::create_dir_all(&db_dir).unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        supervisor.abort();
    }

    #[test]
    fn remote_detection_by_scheme() {
        assert!(DatabaseConfig::new("libsql://puppy.turso.io").is_remote());
        assert!(DatabaseConfig::new("https://puppy.turso.io").is_remote());
        assert!(!DatabaseConfig::new("puppy-tracker.db").is_remote());
        assert!(!DatabaseConfig::in_memory().is_remote());
    }

    #[test]
    fn debug_redacts_token() {
        let config = DatabaseConfig::new("libsql://puppy.turso.io").with_auth_token("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
