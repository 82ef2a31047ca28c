//! Typed errors for the job parsing pipeline.
//!
//! Classification and normalization are total and have no error type.
//! Only retrieval, document decoding, persistence and configuration fail.

use thiserror::Error;

/// The posting could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or uses a scheme we don't fetch
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Request did not complete within the configured timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Connection, TLS or body read failure
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The retrieved document could not be treated as markup at all.
///
/// A missing field is never an error; it degrades to its canonical default.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is not valid UTF-8")]
    InvalidEncoding,

    #[error("document is empty")]
    EmptyDocument,
}

/// Failure of the single-source pipeline.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to fetch job posting: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to parse job posting: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Failure reported by a persistence collaborator for one record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the single-source pipeline.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
