//! Submission failures and their mapping to HTTP outcomes.
//!
//! Classification happens once, where a failure surfaces out of request
//! handling. Nothing here is retried; retries are the client's business.

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for submission handling
pub type Result<T> = std::result::Result<T, SubmissionError>;

/// Failure categories raised while receiving or handling a submission.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The client went away before the exchange completed.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The request body exceeded the configured size limit.
    #[error("payload exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The request path does not name a valid namespace or id.
    #[error("invalid resource path: {0}")]
    InvalidResource(String),

    /// An access policy rejected the request.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Anything not otherwise classified.
    #[error("unexpected error: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SubmissionError {
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn unexpected_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Outcome of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Status to answer with; `None` leaves the connection to close silently.
    pub status: Option<StatusCode>,
    /// Whether the failure is logged at error severity.
    pub log: bool,
}

/// Map a failure to its HTTP outcome. Total and deterministic.
pub fn classify(error: &SubmissionError) -> Classification {
    match error {
        SubmissionError::ConnectionClosed => Classification {
            status: None,
            log: false,
        },
        SubmissionError::PayloadTooLarge { .. } => Classification {
            status: Some(StatusCode::PAYLOAD_TOO_LARGE),
            log: false,
        },
        SubmissionError::InvalidResource(_) => Classification {
            status: Some(StatusCode::NOT_FOUND),
            log: false,
        },
        SubmissionError::AccessDenied(_) => Classification {
            status: Some(StatusCode::FORBIDDEN),
            log: true,
        },
        SubmissionError::Unexpected { .. } => Classification {
            status: Some(StatusCode::INTERNAL_SERVER_ERROR),
            log: true,
        },
    }
}
