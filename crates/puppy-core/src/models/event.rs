//! Event record model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Client-generated event identifier (Unix milliseconds at creation time).
///
/// This is the external key for lookup and delete, not a database rowid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// The closed set of things worth tracking about a puppy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pee,
    Poop,
    Water,
    Food,
}

impl EventKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 4] = [Self::Pee, Self::Poop, Self::Water, Self::Food];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pee => "pee",
            Self::Poop => "poop",
            Self::Water => "water",
            Self::Food => "food",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pee => "Pee",
            Self::Poop => "Poop",
            Self::Water => "Water",
            Self::Food => "Food",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Pee => "🚽",
            Self::Poop => "💩",
            Self::Water => "💧",
            Self::Food => "🍖",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pee" => Ok(Self::Pee),
            "poop" => Ok(Self::Poop),
            "water" => Ok(Self::Water),
            "food" => Ok(Self::Food),
            other => Err(Error::InvalidInput(format!(
                "unknown event type '{other}' (expected pee, poop, water or food)"
            ))),
        }
    }
}

/// One timestamped, categorized fact about the puppy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub id: EventId,
}

impl EventRecord {
    /// Build a record, truncating the timestamp to millisecond precision.
    #[must_use]
    pub fn new(id: EventId, kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp: truncate_to_millis(timestamp),
            id,
        }
    }

    /// Build a record from the Unix-millisecond form used at rest.
    pub fn from_millis(id: EventId, kind: EventKind, timestamp_ms: i64) -> Result<Self> {
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
            Error::Database(format!("timestamp out of range for event {id}: {timestamp_ms}"))
        })?;
        Ok(Self::new(id, kind, timestamp))
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Reject records that could not have come from a client clock.
    pub fn validate(&self) -> Result<()> {
        if self.id.value() <= 0 {
            return Err(Error::InvalidInput(format!(
                "event id must be a positive integer, got {}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Which records a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventFilter {
    #[default]
    All,
    Kind(EventKind),
}

impl EventFilter {
    pub fn matches(self, record: &EventRecord) -> bool {
        match self {
            Self::All => true,
            Self::Kind(kind) => record.kind == kind,
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Kind(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for EventFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Kind)
        }
    }
}

fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let millis_only = timestamp.nanosecond() / 1_000_000 * 1_000_000;
    timestamp.with_nanosecond(millis_only).unwrap_or(timestamp)
}

/// ISO-8601 with exactly three fractional digits and a `Z` suffix,
/// e.g. `2024-05-01T10:00:00.000Z`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    /// Same format for optional timestamps; `None` becomes `null`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::Serializer;

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
