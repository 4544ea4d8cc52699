//! Error types for the PDS client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the PDS client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API key required")]
    MissingApiKey,

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Unknown accumulator mode '{mode}' (expected 'queue' or 'list')")]
    UnknownAccumulatorMode { mode: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Request rejected by PDS with {status}: {body}")]
    ClientRequest { status: u16, body: String },

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("A pagination run is already in progress")]
    PaginationInProgress,

    #[error("Pagination worker failed: {message}")]
    Worker { message: String },

    #[error("Pagination run failed: {message}")]
    RunFailed { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a client request error
    pub fn client_request(status: u16, body: impl Into<String>) -> Self {
        Self::ClientRequest {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Check if this error is worth another attempt
    ///
    /// Only transport failures, non-client HTTP statuses and undecodable
    /// bodies are retried. Everything else is terminal for the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Decode { .. } => true,
            Error::HttpStatus { status, .. } => !is_client_error(*status),
            _ => false,
        }
    }

    /// Status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } | Error::ClientRequest { status, .. } => {
                Some(*status)
            }
            Error::RetriesExhausted { source, .. } => source.status(),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Client errors are never retried. 400 itself counts as a client error.
pub(crate) fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Result type alias for the PDS client
pub type Result<T> = std::result::Result<T, Error>;
