//! JSON envelope protocol.
//!
//! ```text
//! {"version": 1, "sender": "alice@example.com", "recipient": null,
//!  "entities": [{"type": "post", ...}], "signature": "<hex>"}
//! ```
//!
//! The signature covers `signing_input(sender, recipient, entities)`. Entity
//! objects are left as JSON values; typing them is the mapper's job.

use serde_json::Value;

use crate::protocols::common::{check_recipient, verify_author};
use crate::protocols::{Protocol, ProtocolError, ReceiveContext};
use crate::{Payload, ProtocolId, SenderHandle};

pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{Envelope, looks_like_envelope, parse_envelope, signing_input};

pub const PROTOCOL_ID: ProtocolId = ProtocolId::new("envelope");

/// Message produced by `EnvelopeProtocol::receive`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeMessage {
    pub sender: SenderHandle,
    pub recipient: Option<String>,
    pub entities: Vec<Value>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeProtocol;

impl Protocol for EnvelopeProtocol {
    type Message = EnvelopeMessage;

    fn id(&self) -> ProtocolId {
        PROTOCOL_ID
    }

    fn identify(&self, payload: &Payload) -> bool {
        looks_like_envelope(payload.as_bytes())
    }

    fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, EnvelopeMessage), ProtocolError> {
        let envelope = parse_envelope(payload.as_bytes())?;
        let sender = SenderHandle::new(envelope.sender.as_str());

        check_recipient(envelope.recipient.as_deref(), context)?;
        let signed = signing_input(
            &envelope.sender,
            envelope.recipient.as_deref(),
            &envelope.entities,
        );
        verify_author(&sender, &signed, envelope.signature.as_deref(), context)?;

        let message = EnvelopeMessage {
            sender: sender.clone(),
            recipient: envelope.recipient,
            entities: envelope.entities,
        };
        Ok((sender, message))
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::{Value, json};

    use super::{EnvelopeProtocol, signing_input};
    use crate::keys::PublicKey;
    use crate::protocols::{Protocol, ProtocolError, ReceiveContext};
    use crate::{LocalUser, Payload, SenderHandle};

    fn signed_envelope(recipient: Option<&str>, entities: Vec<Value>, key: &SigningKey) -> Payload {
        let signed = signing_input("alice@example.com", recipient, &entities);
        let signature = hex::encode(key.sign(&signed).to_bytes());
        let document = json!({
            "version": 1,
            "sender": "alice@example.com",
            "recipient": recipient,
            "entities": entities,
            "signature": signature,
        });
        Payload::from(document.to_string())
    }

    #[test]
    fn receive_signed_envelope() {
        let signing = SigningKey::from_bytes(&[5u8; 32]);
        let key = PublicKey::from(signing.verifying_key());
        let fetcher = move |sender: &SenderHandle| {
            (sender.as_str() == "alice@example.com").then_some(key)
        };
        let entities = vec![json!({"type": "post", "guid": "0123456789abcdef", "text": "hi"})];
        let payload = signed_envelope(None, entities.clone(), &signing);

        let context = ReceiveContext::new().with_sender_key_fetcher(&fetcher);
        let (sender, message) = EnvelopeProtocol.receive(&payload, &context).unwrap();
        assert_eq!(sender.as_str(), "alice@example.com");
        assert_eq!(message.entities, entities);
    }

    #[test]
    fn receive_detects_tampering() {
        let signing = SigningKey::from_bytes(&[5u8; 32]);
        let key = PublicKey::from(signing.verifying_key());
        let fetcher = move |_: &SenderHandle| Some(key);
        let payload = signed_envelope(None, vec![json!({"type": "post", "text": "hi"})], &signing);
        let tampered = Payload::from(
            payload
                .as_str()
                .unwrap()
                .replace("\"text\":\"hi\"", "\"text\":\"bye\""),
        );

        let context = ReceiveContext::new().with_sender_key_fetcher(&fetcher);
        let err = EnvelopeProtocol.receive(&tampered, &context).unwrap_err();
        assert!(matches!(err, ProtocolError::VerificationFailed { .. }));
    }

    #[test]
    fn receive_addressed_envelope_needs_matching_user() {
        let signing = SigningKey::from_bytes(&[5u8; 32]);
        let bob = LocalUser::new("bob@example.org");
        let carol = LocalUser::new("carol@example.org");
        let payload = signed_envelope(Some("bob@example.org"), Vec::new(), &signing);
        let skipped = ReceiveContext::new().with_author_verification_skipped(true);

        let err = EnvelopeProtocol.receive(&payload, &skipped).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingRecipient));
        let err = EnvelopeProtocol
            .receive(&payload, &skipped.with_user(&carol))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::EncryptedMessage { .. }));
        EnvelopeProtocol
            .receive(&payload, &skipped.with_user(&bob))
            .unwrap();
    }

    #[test]
    fn receive_without_sender_reports_missing_header() {
        let payload = Payload::from(r#"{"entities": []}"#);
        assert!(EnvelopeProtocol.identify(&payload));
        let context = ReceiveContext::new().with_author_verification_skipped(true);
        let err = EnvelopeProtocol.receive(&payload, &context).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingHeader { header: "sender" }));
    }

    #[test]
    fn receive_broken_json_is_malformed() {
        let payload = Payload::from(r#"{"entities": [}"#);
        assert!(EnvelopeProtocol.identify(&payload));
        let context = ReceiveContext::new().with_author_verification_skipped(true);
        let err = EnvelopeProtocol.receive(&payload, &context).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { .. }));
    }
}
