//! Error types for the hospital API client.
//!
//! # Design
//! The UI only ever shows a message, so `Display` for backend-originated
//! failures is exactly the backend's `message` text. `NotFound` keeps its own
//! variant because detail screens branch on it; every other non-2xx lands in
//! `Http` with the status kept for logs.

use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend returned 404.
    #[error("{0}")]
    NotFound(String),

    /// The backend returned a non-2xx status other than 404.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx envelope carrying `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The round-trip itself failed (connection refused, broken body).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A form draft failed validation; nothing was sent.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl ApiError {
    /// HTTP status when the failure came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
