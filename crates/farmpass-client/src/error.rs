use thiserror::Error;

use farmpass_shared::{DecodeError, ValidationError};

/// A failed backend call, as seen at the component that issued it.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No or partial response.
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 401/403. The backend's message is kept because it is still
    /// inspected for business-rule phrases.
    #[error("Not authorised (HTTP {status})")]
    Unauthenticated { status: u16, message: Option<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx answer, carrying the backend's `{error}` text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Decode(_) | Self::InvalidUrl(_) => ErrorKind::NetworkFailure,
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Rejected { .. } => ErrorKind::Rejected,
        }
    }

    /// Backend-supplied text, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated { message, .. } => message.as_deref(),
            Self::NotFound(message) | Self::Rejected { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Inline text for a view: what went wrong plus what to do next.
    pub fn user_message(&self) -> String {
        Notice::from(self).to_string()
    }
}

/// Client-side error taxonomy. Every failure that reaches a view is one of
/// these, with an actionable next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    Unauthenticated,
    ValidationFailure,
    NotFound,
    AlreadyClaimed,
    Expired,
    /// A business-rule rejection the client has no dedicated handling for.
    Rejected,
}

impl ErrorKind {
    pub fn next_step(self) -> &'static str {
        match self {
            Self::NetworkFailure => "Check your connection and try again.",
            Self::Unauthenticated => "Please log in again.",
            Self::ValidationFailure => "Correct the highlighted input.",
            Self::NotFound => "Check the code and go back to the scanner.",
            Self::AlreadyClaimed => "Scan another receipt to collect more badges.",
            Self::Expired => "Receipts can only be claimed within 7 days.",
            Self::Rejected => "Try again, or go back to the scanner.",
        }
    }
}

/// Inline message rendered by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn session_expired() -> Self {
        Self::new(ErrorKind::Unauthenticated, "Session expired. Please login again.")
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }
}

impl From<&ApiError> for Notice {
    fn from(e: &ApiError) -> Self {
        match e {
            ApiError::Unauthenticated { .. } => Self::session_expired(),
            other => Self::new(other.kind(), other.to_string()),
        }
    }
}

impl From<&ValidationError> for Notice {
    fn from(e: &ValidationError) -> Self {
        Self::new(ErrorKind::ValidationFailure, e.to_string())
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.kind.next_step())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Please enter your private key")]
    Missing,

    #[error("Private key is not valid hex")]
    InvalidHex,

    #[error("Private key must be 32 bytes")]
    InvalidLength,

    #[error("Private key is not a valid secp256k1 scalar")]
    InvalidKey,
}

impl From<&CredentialError> for Notice {
    fn from(e: &CredentialError) -> Self {
        Self::new(ErrorKind::ValidationFailure, e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Camera failed to stop: {0}")]
    Stop(String),
}
