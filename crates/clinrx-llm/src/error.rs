//! Analysis client errors.

use thiserror::Error;

/// Fallback text when a failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An unknown error occurred while contacting the analysis service.";

/// Errors from the transport layer (network, auth, rate limits).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No API key configured for the analysis service")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analysis service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed service response: {0}")]
    MalformedEnvelope(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Message suitable for display, falling back to a generic text.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            TransportError::Status { status, .. } => {
                format!("The analysis service returned HTTP {}.", status)
            }
            TransportError::MissingCredential => {
                "No API key is configured for the analysis service.".to_string()
            }
            TransportError::Http(e) => e.to_string(),
            TransportError::MalformedEnvelope(_) | TransportError::Client(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// Coarse error class, for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    EmptyResponse,
    InvalidResponseFormat,
    TransportFailure,
}

/// Analysis errors. All are terminal for the current submission.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("The analysis produced no result.")]
    EmptyResponse,

    #[error("The AI returned an invalid JSON response. Please try again or adjust your inputs.")]
    InvalidResponseFormat {
        /// Parser or schema detail, for logs
        detail: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AnalysisError {
    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        AnalysisError::InvalidResponseFormat {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            AnalysisError::EmptyResponse => AnalysisErrorKind::EmptyResponse,
            AnalysisError::InvalidResponseFormat { .. } => AnalysisErrorKind::InvalidResponseFormat,
            AnalysisError::Transport(_) => AnalysisErrorKind::TransportFailure,
        }
    }

    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Transport(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, AnalysisError>;
