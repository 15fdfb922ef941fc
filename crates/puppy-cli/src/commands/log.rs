use puppy_core::EventKind;

use crate::commands::common::{format_local_time, open_client, report_notices};
use crate::error::CliError;

pub async fn run_log(kind: EventKind, api_url: Option<String>) -> Result<(), CliError> {
    let mut client = open_client(api_url)?;

    match client.create(kind).await {
        Ok(event) => {
            println!(
                "{} {} logged at {} ({})",
                event.kind.emoji(),
                event.kind.label(),
                format_local_time(event.timestamp),
                event.id
            );
            Ok(())
        }
        Err(error) => {
            report_notices(&mut client);
            Err(error.into())
        }
    }
}
