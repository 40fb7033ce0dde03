use thiserror::Error;

/// Errors raised by a protocol while receiving a payload.
///
/// These are surfaced to the dispatch caller unchanged, so a caller can tell
/// which protocol-level check rejected the payload.
///
/// # Examples
/// ```
/// use fedwire_core::protocols::ProtocolError;
///
/// let err = ProtocolError::MissingHeader { header: "sender" };
/// assert!(err.to_string().contains("missing required header"));
/// ```
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload requires a local recipient but none was given")]
    MissingRecipient,
    #[error("payload could not be opened: {reason}")]
    EncryptedMessage { reason: String },
    #[error("author verification failed for {sender}: {reason}")]
    VerificationFailed { sender: String, reason: String },
    #[error("no public key available for sender {sender}")]
    SenderKeyNotFound { sender: String },
    #[error("payload is missing required header: {header}")]
    MissingHeader { header: &'static str },
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

impl ProtocolError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }
}
