//! Plain line protocol.
//!
//! `<sender>;<visibility>;<text>[;sig=<hex>]` where visibility is `PUBLIC`
//! or `PRIVATE:<recipient>`. The text may contain separators; only a trailing
//! `;sig=` field of exactly 128 hex digits is treated as the Ed25519
//! signature over everything before it. Private payloads can only be opened by their named recipient.
//!
//! Version française (résumé):
//! Protocole ligne simple `expéditeur;visibilité;texte[;sig=hex]`. Les
//! messages privés exigent l'utilisateur local destinataire.

use sha2::{Digest, Sha256};

use crate::protocols::common::{check_recipient, verify_author};
use crate::protocols::{Protocol, ProtocolError, ReceiveContext};
use crate::{Payload, ProtocolId, SenderHandle};

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{PlainEnvelope, Visibility, looks_like_plain, parse_plain};

pub const PROTOCOL_ID: ProtocolId = ProtocolId::new("plain");

/// Message produced by `PlainProtocol::receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMessage {
    pub sender: SenderHandle,
    pub public: bool,
    pub text: String,
    /// Lowercase hex SHA-256 of the signed bytes.
    pub digest: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainProtocol;

impl Protocol for PlainProtocol {
    type Message = PlainMessage;

    fn id(&self) -> ProtocolId {
        PROTOCOL_ID
    }

    fn identify(&self, payload: &Payload) -> bool {
        looks_like_plain(payload.as_bytes())
    }

    fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, PlainMessage), ProtocolError> {
        let envelope = parse_plain(payload.as_bytes())?;
        let sender = SenderHandle::new(envelope.sender);
        let recipient = envelope.visibility.recipient();

        check_recipient(recipient, context)?;
        verify_author(
            &sender,
            envelope.signed.as_bytes(),
            envelope.signature,
            context,
        )?;

        let message = PlainMessage {
            sender: sender.clone(),
            public: recipient.is_none(),
            text: envelope.text.to_string(),
            digest: hex::encode(Sha256::digest(envelope.signed.as_bytes())),
        };
        Ok((sender, message))
    }
}
