//! Error types for api-data-export
//!
//! A single [`Error`] enum covers every failure the library can surface. Only the
//! entity-list query, configuration problems and sink I/O ever reach the caller;
//! per-identifier detail failures are absorbed by the batch fetcher and show up as
//! missing rows plus a counter in the export summary.

use thiserror::Error;

/// Result type alias for api-data-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for api-data-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "export.batch_size")
        key: Option<String>,
    },

    /// Transport-level failure (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream service answered with a non-success HTTP status
    #[error("upstream returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The GraphQL response carried errors and no usable data
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The entity-list query failed; the export cannot proceed
    #[error("entity list fetch failed: {0}")]
    EntityFetch(Box<Error>),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, used in the binary's final log line
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(e) if e.is_timeout() => "timeout",
            Error::Network(_) => "network_error",
            Error::Status { .. } => "upstream_status",
            Error::GraphQl(_) => "graphql_error",
            Error::EntityFetch(_) => "entity_fetch_failed",
            Error::Serialization(_) => "serialization_error",
            Error::Csv(_) => "csv_error",
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }
}
