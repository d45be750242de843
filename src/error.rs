//! oneM2M client error types.
//!
//! Errors fall into a few families:
//!
//! - **Structural / contract**: raised synchronously while a request is being
//!   resolved, before any byte reaches the network.
//! - **Transport**: surfaced unmodified from the HTTP client; this layer never
//!   retries.
//! - **Callback / listener**: raised at the registry call site. The inbound
//!   notification loop converts them to HTTP error responses instead of
//!   propagating.

use thiserror::Error;

use crate::protocol::Operation;

/// oneM2M client errors.
#[derive(Error, Debug)]
pub enum OneM2MError {
    /// The parameter collection was not a key/value mapping.
    #[error("Request params must be a mapping, {found} received")]
    InvalidParameterStructure {
        /// JSON type that was actually supplied.
        found: String,
    },

    /// A parameter name is not part of the oneM2M parameter catalog.
    #[error("{0} is not a valid oneM2M request parameter")]
    UnknownParameter(String),

    /// A parameter required by the requested operation is absent.
    #[error("The \"{operation}\" op requires the \"{parameter}\" param be included in the request")]
    MissingParameter {
        /// Operation being validated.
        operation: Operation,
        /// Missing parameter name.
        parameter: String,
    },

    /// A response primitive lacks one or more control headers.
    #[error("oneM2M response primitive missing required control param(s): {}", .0.join(", "))]
    MissingControlParameters(Vec<String>),

    /// A resource was built without one of its required attributes.
    #[error("Missing required attribute in {resource}: \"{attribute}\"")]
    MissingRequiredAttribute {
        /// Resource short name.
        resource: &'static str,
        /// Missing attribute name.
        attribute: String,
    },

    /// An argument was unusable for the requested facade operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The HTTP exchange completed with a non-success status.
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Transport-level failure (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A callback was dispatched with a payload that is not a response envelope.
    #[error("Invalid callback argument: {0}")]
    InvalidCallbackArgument(String),

    /// Notification listener lifecycle failure.
    #[error("Listener error: {0}")]
    Listener(String),

    /// A notification handler reported a failure.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for oneM2M operations
pub type Result<T> = std::result::Result<T, OneM2MError>;

impl From<toml::de::Error> for OneM2MError {
    fn from(err: toml::de::Error) -> Self {
        OneM2MError::Config(err.to_string())
    }
}
