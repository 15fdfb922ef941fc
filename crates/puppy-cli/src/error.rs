use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] puppy_core::sync::ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid event id '{0}': expected a positive integer")]
    InvalidEventId(String),
    #[error("Refusing to delete without confirmation; pass --yes when not running interactively")]
    ConfirmationRequired,
}
