use chrono::Utc;
use puppy_core::EventFilter;

use crate::commands::common::{event_to_list_item, format_event_lines, load_client, EventListItem};
use crate::error::CliError;

pub async fn run_list(
    filter: EventFilter,
    limit: Option<usize>,
    as_json: bool,
    api_url: Option<String>,
) -> Result<(), CliError> {
    let client = load_client(api_url).await?;
    let mut events = client.mirror().filtered(filter);
    if let Some(limit) = limit {
        events.truncate(limit);
    }
    let now_ms = Utc::now().timestamp_millis();

    if as_json {
        let json_items = events
            .iter()
            .map(|event| event_to_list_item(event, now_ms))
            .collect::<Vec<EventListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if events.is_empty() {
        match filter {
            EventFilter::All => println!("No events yet"),
            EventFilter::Kind(kind) => println!("No {} events yet", kind.label().to_lowercase()),
        }
    } else {
        for line in format_event_lines(&events, now_ms) {
            println!("{line}");
        }
    }

    Ok(())
}
