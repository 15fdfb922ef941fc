use std::io::{self, IsTerminal};

use chrono::Utc;

use crate::commands::common::{
    confirm, format_event_line, load_client, parse_event_id, report_notices,
};
use crate::error::CliError;

pub async fn run_delete(id: &str, yes: bool, api_url: Option<String>) -> Result<(), CliError> {
    let id = parse_event_id(id)?;
    let mut client = load_client(api_url).await?;
    client.request_delete(id)?;

    if !yes {
        if !io::stdin().is_terminal() {
            client.cancel_delete();
            return Err(CliError::ConfirmationRequired);
        }

        if let Some(event) = client.mirror().get(id) {
            println!("{}", format_event_line(event, Utc::now().timestamp_millis()));
        }
        let confirmed = confirm(
            "Delete this event?",
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )?;
        if !confirmed {
            client.cancel_delete();
            println!("Cancelled");
            return Ok(());
        }
    }

    match client.confirm_delete().await {
        Ok(deleted) => {
            println!("{}", deleted.id);
            Ok(())
        }
        Err(error) => {
            report_notices(&mut client);
            Err(error.into())
        }
    }
}
