//! puppy-core - Core library for Puppy Tracker
//!
//! This crate contains the event model, the connectivity-gated event store,
//! the "time since last" analytics, and the client-side synchronization layer
//! shared by the API server and the CLI.

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{EventFilter, EventId, EventKind, EventRecord};
pub use state::ConnectionState;
