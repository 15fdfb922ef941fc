//! Shared connectivity state.

use serde::Serialize;

/// Lifecycle of the single shared database connection.
///
/// Owned and mutated by [`crate::db::ConnectionManager`] only; everyone else
/// observes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Store operations may only touch the database in this state.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Connected)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}
