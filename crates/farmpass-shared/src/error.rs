use thiserror::Error;

/// Malformed form or scan input. Always detected locally, never sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a code to look up")]
    EmptyCode,

    #[error("{0} is required")]
    Required(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Unknown {field}: {value}")]
    NotAllowed { field: &'static str, value: String },

    #[error("Selected batch is not in the available list")]
    UnknownBatch,
}

/// A backend payload that could not be normalized into a domain record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
