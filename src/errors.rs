//! Errors for the aviation weather recorder
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvwxError {
    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("CSV error")]
    CsvError(#[from] csv::Error),

    #[error("HTTP error")]
    HttpError(#[from] reqwest::Error),

    #[error("Snapshot read failed: {}: {origin}", .path.display())]
    SnapshotReadError { path: PathBuf, origin: String },

    #[error("Snapshot write failed: {}: {origin}", .path.display())]
    SnapshotWriteError { path: PathBuf, origin: String },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Feed connection failed: {addr}: {origin}")]
    FeedConnectionError { addr: String, origin: String },
}
