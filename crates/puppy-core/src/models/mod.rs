//! Data models for Puppy Tracker

mod event;

pub use event::{iso_millis, EventFilter, EventId, EventKind, EventRecord};
