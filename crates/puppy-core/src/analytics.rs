//! "Time since last" derivations over the event log.
//!
//! Everything here is pure and works on whatever slice it is handed. Inputs
//! are re-sorted newest first before use, so callers may pass the log in any
//! order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{EventFilter, EventKind, EventRecord};

/// Gap between two events, truncated to whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Interval {
    pub hours: i64,
    pub minutes: i64,
}

impl Interval {
    /// Absolute difference between two instants. Seconds are dropped.
    pub fn between(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        let total_minutes = (a - b).num_minutes().abs();
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }

    pub const fn total_minutes(self) -> i64 {
        self.hours * 60 + self.minutes
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// Per-category rollup shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: EventKind,
    #[serde(with = "crate::models::iso_millis::option")]
    pub last: Option<DateTime<Utc>>,
    pub interval: Option<Interval>,
    pub count: usize,
}

fn newest_first(events: &[EventRecord], kind: EventKind) -> Vec<&EventRecord> {
    let mut matching = events
        .iter()
        .filter(|record| record.kind == kind)
        .collect::<Vec<_>>();
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matching
}

/// Timestamp of the most recent event of `kind`.
pub fn last_occurrence(events: &[EventRecord], kind: EventKind) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|record| record.kind == kind)
        .map(|record| record.timestamp)
        .max()
}

/// Gap between the two most recent events of `kind`, if there are two.
pub fn last_interval(events: &[EventRecord], kind: EventKind) -> Option<Interval> {
    let matching = newest_first(events, kind);
    match matching.as_slice() {
        [latest, previous, ..] => Some(Interval::between(latest.timestamp, previous.timestamp)),
        _ => None,
    }
}

/// Human rendering of [`last_occurrence`], local to the viewer.
pub fn describe_last_occurrence(last: Option<DateTime<Utc>>) -> String {
    last.map_or_else(
        || "No events yet".to_string(),
        |timestamp| {
            timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// Human rendering of [`last_interval`].
pub fn describe_interval(interval: Option<Interval>) -> String {
    interval.map_or_else(|| "N/A".to_string(), |interval| interval.to_string())
}

/// One summary per category, in [`EventKind::ALL`] order.
pub fn summarize(events: &[EventRecord]) -> Vec<KindSummary> {
    EventKind::ALL
        .iter()
        .map(|&kind| KindSummary {
            kind,
            last: last_occurrence(events, kind),
            interval: last_interval(events, kind),
            count: events.iter().filter(|record| record.kind == kind).count(),
        })
        .collect()
}

/// Records matching `filter`, in their original relative order.
pub fn filter_events(events: &[EventRecord], filter: EventFilter) -> Vec<EventRecord> {
    events
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}
