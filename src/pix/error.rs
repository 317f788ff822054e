//! Pix encoder and decoder error definitions.

use thiserror::Error;

/// Errors that abort payload generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixError {
    /// Payee key is empty or cannot fit in the merchant account template.
    #[error("Invalid Pix key: {0}")]
    InvalidKey(String),

    /// Amount is negative, not a number, or not representable in cents.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Errors raised while parsing an existing payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended in the middle of a tag, length or value.
    #[error("Payload truncated at offset {0}")]
    Truncated(usize),

    /// Tag or length header is not two ASCII digits.
    #[error("Invalid TLV header at offset {0}")]
    InvalidHeader(usize),

    /// A mandatory field is absent.
    #[error("Missing field {0}")]
    MissingField(&'static str),

    /// Trailing checksum does not match the content.
    #[error("Checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The amount field is not a two-decimal number.
    #[error("Invalid amount field: {0}")]
    InvalidAmount(String),
}

/// Result type for payload generation.
pub type PixResult<T> = Result<T, PixError>;
