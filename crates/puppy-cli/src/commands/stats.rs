use chrono::Utc;

use crate::commands::common::{format_summary_lines, load_client};
use crate::error::CliError;

pub async fn run_stats(as_json: bool, api_url: Option<String>) -> Result<(), CliError> {
    let client = load_client(api_url).await?;
    let summaries = client.mirror().summaries();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for line in format_summary_lines(&summaries, Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }

    Ok(())
}
