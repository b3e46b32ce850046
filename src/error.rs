//! Error types for the backend client, chat exchanges and manual form edits.

use thiserror::Error;

/// Failures talking to the CRM backend. Every variant is a transport failure
/// from the point of view of an exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend URL is not configured")]
    NotConfigured,

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to connect to backend at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// The caller stopped waiting before the backend replied
    #[error("Request was cancelled")]
    Cancelled,
}

impl BackendError {
    /// Short label for logs; never carries response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NotConfigured => "not_configured",
            BackendError::Timeout => "timeout",
            BackendError::Connect { .. } => "connect",
            BackendError::Request(_) => "request",
            BackendError::Status { .. } => "status",
            BackendError::Decode(_) => "decode",
            BackendError::Cancelled => "cancelled",
        }
    }
}

/// Reasons a chat exchange could not complete
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("An exchange is already in progress")]
    Busy,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Rejected manual edits to the interaction record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Index {index} out of range for {field} (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
}
