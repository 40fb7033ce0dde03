use crate::SenderHandle;
use crate::keys::SIGNATURE_LEN;
use crate::protocols::{ProtocolError, ReceiveContext};

/// Verify that `signature_hex` is the sender's signature over `signed`.
///
/// Skipping verification short-circuits before the key fetcher is consulted.
pub(crate) fn verify_author(
    sender: &SenderHandle,
    signed: &[u8],
    signature_hex: Option<&str>,
    context: &ReceiveContext<'_>,
) -> Result<(), ProtocolError> {
    if context.skip_author_verification {
        return Ok(());
    }

    let signature_hex =
        signature_hex.ok_or_else(|| verification_failed(sender, "payload is not signed"))?;
    let signature = decode_signature(signature_hex)
        .ok_or_else(|| verification_failed(sender, "signature is not 64 hex-encoded bytes"))?;

    let key = context
        .sender_key_fetcher
        .and_then(|fetcher| fetcher.fetch(sender))
        .ok_or_else(|| ProtocolError::SenderKeyNotFound {
            sender: sender.to_string(),
        })?;

    if !key.verify(signed, &signature) {
        return Err(verification_failed(
            sender,
            "signature does not match sender key",
        ));
    }
    Ok(())
}

/// Ensure a payload addressed to `recipient` can be opened by the local user.
pub(crate) fn check_recipient(
    recipient: Option<&str>,
    context: &ReceiveContext<'_>,
) -> Result<(), ProtocolError> {
    let Some(recipient) = recipient else {
        return Ok(());
    };
    let user = context.user.ok_or(ProtocolError::MissingRecipient)?;
    if user.handle() != recipient {
        return Err(ProtocolError::EncryptedMessage {
            reason: format!("addressed to {recipient}, not {}", user.handle()),
        });
    }
    Ok(())
}

fn decode_signature(value: &str) -> Option<[u8; SIGNATURE_LEN]> {
    let raw = hex::decode(value.trim()).ok()?;
    raw.as_slice().try_into().ok()
}

fn verification_failed(sender: &SenderHandle, reason: &str) -> ProtocolError {
    ProtocolError::VerificationFailed {
        sender: sender.to_string(),
        reason: reason.to_string(),
    }
}
