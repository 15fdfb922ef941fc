use std::io::{BufRead, Write};

use chrono::{DateTime, Local, Utc};
use puppy_core::analytics::{describe_interval, describe_last_occurrence, KindSummary};
use puppy_core::config::ClientConfig;
use puppy_core::sync::{HttpEventsApi, SyncClient};
use puppy_core::{EventId, EventRecord};
use serde::Serialize;

use crate::error::CliError;

pub type Client = SyncClient<HttpEventsApi>;

#[derive(Debug, Serialize)]
pub struct EventListItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub relative_time: String,
}

/// Build a client for the configured API without fetching anything.
pub fn open_client(api_url: Option<String>) -> Result<Client, CliError> {
    let config = ClientConfig::resolve(api_url)?;
    tracing::debug!(api = %config.api_base_url, "Using events API");
    Ok(SyncClient::new(HttpEventsApi::new(config)?))
}

/// Build a client and load the current event log.
pub async fn load_client(api_url: Option<String>) -> Result<Client, CliError> {
    let mut client = open_client(api_url)?;
    client.load().await?;
    Ok(client)
}

/// Print queued notices to stderr.
pub fn report_notices(client: &mut Client) {
    for notice in client.drain_notices() {
        eprintln!("{notice}");
    }
}

pub fn parse_event_id(raw: &str) -> Result<EventId, CliError> {
    raw.parse::<EventId>()
        .ok()
        .filter(|id| id.value() > 0)
        .ok_or_else(|| CliError::InvalidEventId(raw.trim().to_string()))
}

pub fn format_event_line(event: &EventRecord, now_ms: i64) -> String {
    format!(
        "{:<13}  {} {:<5}  {}  {}",
        event.id.value(),
        event.kind.emoji(),
        event.kind.label(),
        format_local_time(event.timestamp),
        format_relative_time(event.timestamp_millis(), now_ms)
    )
}

pub fn format_event_lines(events: &[EventRecord], now_ms: i64) -> Vec<String> {
    events
        .iter()
        .map(|event| format_event_line(event, now_ms))
        .collect()
}

pub fn event_to_list_item(event: &EventRecord, now_ms: i64) -> EventListItem {
    EventListItem {
        id: event.id.value(),
        kind: event.kind.as_str().to_string(),
        timestamp: event
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        relative_time: format_relative_time(event.timestamp_millis(), now_ms),
    }
}

pub fn format_summary_lines(summaries: &[KindSummary], now_ms: i64) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            let last = summary.last.map_or_else(
                || describe_last_occurrence(None),
                |last| {
                    format!(
                        "{} ({})",
                        format_local_time(last),
                        format_relative_time(last.timestamp_millis(), now_ms)
                    )
                },
            );
            format!(
                "{} {:<5}  last: {:<32}  interval: {:<8}  count: {}",
                summary.kind.emoji(),
                summary.kind.label(),
                last,
                describe_interval(summary.interval),
                summary.count
            )
        })
        .collect()
}

pub fn format_local_time(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h {}m ago", diff / hour, (diff % hour) / minute)
    } else {
        format!("{}d ago", diff / day)
    }
}

/// Ask a yes/no question. Anything but `y`/`yes` is a no.
pub fn confirm(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
