//! Error types shared across the crate.

use thiserror::Error;

/// Errors emitted by `TypingSession`.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot load an empty quote")]
    InvalidLoad,
}

/// Errors emitted by a `QuoteSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("quote request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("quote service returned no text")]
    EmptyResponse,
    #[error("no bundled quotes available")]
    NoBundledQuotes,
    #[error("unable to decode quote: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while persisting configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
