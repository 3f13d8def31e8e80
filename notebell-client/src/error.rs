//! Error types for the client.

use crate::config::ConfigError;
use notebell_core::NoteError;

pub const USAGE: &str = "usage: notebell [--config <path>] [watch | list [QUERY]]";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error("HTTP client setup failed: {0}")]
    HttpSetup(#[from] reqwest::Error),
    #[error("Tracing setup failed: {0}")]
    Telemetry(#[from] tracing_subscriber::util::TryInitError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}; {usage}", usage = USAGE)]
    Usage(String),
}
