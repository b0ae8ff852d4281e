//! Error types for tankwatch-core.
//!
//! Only ingestion can fail. Resampling, threshold evaluation and alert
//! aggregation operate on in-memory data that is well-formed by construction
//! and therefore never return errors.
//!
//! # Recovery
//!
//! | Error Type | Strategy |
//! |------------|----------|
//! | [`Error::Io`] | Log, keep the current store contents |
//! | [`Error::Http`] | Log, keep the current store contents |
//! | [`Error::Status`] | Log, keep the current store contents |
//! | [`Error::Csv`] | Log, keep the current store contents |
//! | [`Error::Sink`] | Log, continue notifying observers |
//! | [`Error::InvalidConfig`] | Fix configuration and restart |
//!
//! Malformed CSV rows are not errors: they are dropped while parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading sensor data or delivering alerts.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The sensor log file could not be read.
    #[error("Failed to read sensor log {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The HTTP transport failed before a response was received.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("Sensor log request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read as CSV text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An alert sink failed to deliver an event.
    #[error("Alert sink error: {0}")]
    Sink(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this error comes from loading the sensor log.
    #[must_use]
    pub fn is_ingestion(&self) -> bool {
        match self {
            Error::Io { .. } | Error::Status { .. } | Error::Csv(_) => true,
            #[cfg(feature = "http")]
            Error::Http(_) => true,
            Error::Sink(_) | Error::InvalidConfig(_) => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Sink(err.to_string())
    }
}

/// Result type alias using tankwatch-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
