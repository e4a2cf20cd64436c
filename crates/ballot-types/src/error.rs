use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("text too long: at most {max} characters allowed, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("too many items: at most {max} allowed, got {actual}")]
    TooManyItems { max: usize, actual: usize },
}
