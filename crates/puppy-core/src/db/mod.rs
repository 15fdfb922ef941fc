//! Database layer for Puppy Tracker

mod connection;
mod migrations;
mod repository;

pub use connection::{
    ConnectionManager, DatabaseConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RECONNECT_DELAY,
};
pub use repository::{EventRepository, EventStore};
