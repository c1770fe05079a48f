use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidzproError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not authenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("{endpoint} failed with status {status}: {body}")]
    Http {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("Local storage failed: {reason}")]
    Storage { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl VidzproError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Transient failures the user may retry without re-authenticating.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => status.is_server_error(),
            Self::Rejected { .. } | Self::MalformedResponse { .. } => true,
            _ => false,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }
}

pub type Result<T> = std::result::Result<T, VidzproError>;
