use thiserror::Error;

use crate::protocols::ProtocolError;

/// Errors returned by JSON envelope decoding.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("payload is not a JSON envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("envelope has no sender")]
    MissingSender,
    #[error("unsupported envelope version: {version}")]
    UnsupportedVersion { version: u32 },
}

impl From<EnvelopeError> for ProtocolError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingSender => ProtocolError::MissingHeader { header: "sender" },
            other => ProtocolError::malformed(other.to_string()),
        }
    }
}
