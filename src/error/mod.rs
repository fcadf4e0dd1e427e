//! Error types for the CRM client.

pub mod envelope;

pub use envelope::{ErrorEnvelope, StatusCode};

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all CRM client operations.
#[derive(Error, Debug)]
pub enum CrmError {
    /// Normalized transport or GraphQL failure.
    #[error("{0}")]
    Envelope(#[from] ErrorEnvelope),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token storage error: {0}")]
    Storage(#[from] AuthError),

    #[error("Realtime error: {0}")]
    Realtime(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl CrmError {
    /// Status code carried by an envelope error, if any.
    pub fn status_code(&self) -> Option<&StatusCode> {
        match self {
            Self::Envelope(envelope) => Some(&envelope.status_code),
            _ => None,
        }
    }

    /// Whether the backend rejected the call as unauthenticated.
    pub fn is_unauthenticated(&self) -> bool {
        self.status_code()
            .is_some_and(|code| code.is_code(StatusCode::UNAUTHENTICATED))
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Envelope(envelope) => envelope.message.clone(),
            Self::Decode(msg)
            | Self::Configuration(msg)
            | Self::Realtime(msg)
            | Self::InvalidState(msg) => msg.clone(),
            Self::Storage(err) => err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CrmError>;
