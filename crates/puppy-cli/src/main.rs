//! Puppy CLI - log puppy events from the command line
//!
//! Talks to a running `puppy-api` over HTTP.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::log::run_log;
use crate::commands::stats::run_stats;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("puppy=info".parse().map_err(std::io::Error::other)?)
                .add_directive("puppy_core=warn".parse().map_err(std::io::Error::other)?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Log { kind }) => run_log(kind.into(), cli.api_url).await?,
        Some(Commands::List { kind, limit, json }) => {
            run_list(kind.into(), limit, json, cli.api_url).await?;
        }
        Some(Commands::Stats { json }) => run_stats(json, cli.api_url).await?,
        Some(Commands::Delete { id, yes }) => run_delete(&id, yes, cli.api_url).await?,
        None => run_stats(false, cli.api_url).await?,
    }

    Ok(())
}
