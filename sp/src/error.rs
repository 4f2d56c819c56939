//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering a progress record
///
/// These never reach the collaborator: the dispatcher logs them and moves on.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Endpoint {url} rejected progress update with status {status}")]
    Status { status: u16, url: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding context closed: {0}")]
    Closed(&'static str),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether the far side was reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            TransportError::Network(e) => e.is_connect() || e.is_timeout(),
            TransportError::Io(_) => true,
            TransportError::Closed(_) => true,
            TransportError::Timeout(_) => true,
            TransportError::Status { .. } => false,
            TransportError::Json(_) => false,
        }
    }
}
