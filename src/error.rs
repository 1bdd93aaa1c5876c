//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by newswatch.
#[derive(Error, Debug)]
pub enum WatchError {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be opened or read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A request to an external API failed at the transport layer.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The messaging provider rejected a send request.
    #[error("Provider rejected message (status {status}): {body}")]
    Provider { status: u16, body: String },

    /// Pass-through for raw I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WatchError>;
