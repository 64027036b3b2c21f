//! Error types for the submission client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a page or submitting code
#[derive(Error, Debug)]
pub enum Error {
    /// The request failed before a response was received
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The response body was not a JSON payload object
    #[error("Malformed response payload: {0}")]
    Payload(String),

    /// A submission is already waiting for its response
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// A required element is missing from the document
    #[error("Element not found: #{0}")]
    ElementNotFound(String),

    /// Failed to load or parse the submission page
    #[error("Failed to load page: {0}")]
    Page(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Payload(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Page(err.to_string())
    }
}
