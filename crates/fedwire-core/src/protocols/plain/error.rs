use thiserror::Error;

use crate::protocols::ProtocolError;

/// Errors returned by plain envelope decoding.
///
/// # Examples
/// ```
/// use fedwire_core::protocols::plain::error::PlainError;
///
/// let err = PlainError::MissingFields { needed: 3, actual: 2 };
/// assert!(err.to_string().contains("need 3 fields"));
/// ```
#[derive(Debug, Error)]
pub enum PlainError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("payload has too few fields: need {needed} fields, got {actual}")]
    MissingFields { needed: usize, actual: usize },
    #[error("empty sender field")]
    EmptySender,
    #[error("invalid visibility: {value}")]
    InvalidVisibility { value: String },
    #[error("private payload names no recipient")]
    EmptyRecipient,
}

impl From<PlainError> for ProtocolError {
    fn from(err: PlainError) -> Self {
        match err {
            PlainError::EmptySender => ProtocolError::MissingHeader { header: "sender" },
            other => ProtocolError::malformed(other.to_string()),
        }
    }
}
