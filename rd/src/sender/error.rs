//! Sender error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering one message
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Remote rejected message {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid sender configuration: {0}")]
    InvalidConfig(String),
}

impl SendError {
    /// Check if the remote signalled a rate limit
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SendError::Rejected { status: 429, .. })
    }

    /// Check if this error is transient
    ///
    /// Informational only: dispatch loops never resend, they count the attempt
    /// and move on to the next payload.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendError::Rejected { status, .. } => *status == 429 || *status >= 500,
            SendError::Network(_) => true,
            SendError::Timeout(_) => true,
            SendError::InvalidConfig(_) => false,
        }
    }
}
