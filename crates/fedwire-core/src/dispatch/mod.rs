//! Inbound dispatcher.
//!
//! Pipeline: registry iteration -> `identify` -> `receive` -> mapper `map`.
//! The first protocol that claims the payload is the only one consulted.
//! The receive context is forwarded untouched and the dispatcher keeps no
//! state between calls, so it can be used from any number of threads.
//!
//! Version française (résumé):
//! Le répartiteur parcourt le registre dans l'ordre, choisit le premier
//! protocole qui reconnaît la charge utile, puis appelle `receive` et le
//! mapper associé. Aucune nouvelle tentative, aucun résultat partiel.

use serde::Serialize;
use thiserror::Error;

use crate::entities::Entity;
use crate::mappers::MapError;
use crate::protocols::{ProtocolError, ReceiveContext};
use crate::registry::{ProtocolRegistry, default_registry};
use crate::{Payload, ProtocolId, SenderHandle};

pub(crate) mod events;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub sender: SenderHandle,
    pub protocol: ProtocolId,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no suitable protocol found for payload")]
    NoSuitableProtocolFound,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Mapping(#[from] MapError),
}

/// Dispatch `payload` through the built-in registry.
///
/// # Examples
/// ```
/// use fedwire_core::{Payload, ReceiveContext, handle_receive};
///
/// let payload = Payload::from("alice@example.com;PUBLIC;hello world");
/// let context = ReceiveContext::new().with_author_verification_skipped(true);
/// let result = handle_receive(&payload, &context)?;
/// assert_eq!(result.sender.as_str(), "alice@example.com");
/// assert_eq!(result.protocol.as_str(), "plain");
/// assert_eq!(result.entities.len(), 1);
/// # Ok::<(), fedwire_core::DispatchError>(())
/// ```
pub fn handle_receive(
    payload: &Payload,
    context: &ReceiveContext<'_>,
) -> Result<DispatchResult, DispatchError> {
    handle_receive_with(default_registry(), payload, context)
}

/// Dispatch `payload` through `registry`.
pub fn handle_receive_with(
    registry: &ProtocolRegistry,
    payload: &Payload,
    context: &ReceiveContext<'_>,
) -> Result<DispatchResult, DispatchError> {
    events::started(payload.len(), registry.len());

    let Some(registration) = registry.iter().find(|r| r.identify(payload)) else {
        events::no_match(payload.len());
        return Err(DispatchError::NoSuitableProtocolFound);
    };
    let protocol = registration.id();
    events::matched(protocol);

    let (sender, entities) = registration.receive(payload, context)?;
    events::completed(protocol, &sender, entities.len());
    Ok(DispatchResult {
        sender,
        protocol,
        entities,
    })
}

/// Identify `payload` against the built-in registry without receiving it.
pub fn identify_payload(payload: &Payload) -> Option<ProtocolId> {
    identify_payload_with(default_registry(), payload)
}

pub fn identify_payload_with(registry: &ProtocolRegistry, payload: &Payload) -> Option<ProtocolId> {
    registry
        .iter()
        .find(|r| r.identify(payload))
        .map(|r| r.id())
}

#[cfg(test)]
mod tests {
    use super::{DispatchError, handle_receive, identify_payload};
    use crate::entities::Entity;
    use crate::protocols::{ProtocolError, ReceiveContext};
    use crate::{LocalUser, Payload};

    fn skipped<'a>() -> ReceiveContext<'a> {
        ReceiveContext::new().with_author_verification_skipped(true)
    }

    #[test]
    fn plain_public_payload_maps_to_post() {
        let payload = Payload::from("alice@example.com;PUBLIC;hello world");
        let result = handle_receive(&payload, &skipped()).unwrap();
        assert_eq!(result.sender.as_str(), "alice@example.com");
        assert_eq!(result.protocol.as_str(), "plain");
        let [Entity::Post(post)] = result.entities.as_slice() else {
            panic!("expected one post, got {:?}", result.entities);
        };
        assert_eq!(post.raw_content, "hello world");
    }

    #[test]
    fn unknown_payload_is_not_claimed() {
        let payload = Payload::from(vec![0xff, 0x00, 0x13]);
        assert!(identify_payload(&payload).is_none());
        let err = handle_receive(&payload, &skipped()).unwrap_err();
        assert!(matches!(err, DispatchError::NoSuitableProtocolFound));
    }

    #[test]
    fn private_payload_without_user_keeps_protocol_error() {
        let payload = Payload::from("alice@example.com;PRIVATE:bob@example.org;hi");
        let err = handle_receive(&payload, &skipped()).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Protocol(ProtocolError::MissingRecipient)
        ));
        assert_eq!(err.to_string(), ProtocolError::MissingRecipient.to_string());

        let bob = LocalUser::new("bob@example.org");
        let context = skipped().with_user(&bob);
        assert!(handle_receive(&payload, &context).is_ok());
    }

    #[test]
    fn json_payload_is_identified_as_envelope() {
        let payload = Payload::from(r#"{"sender":"alice@example.com","entities":[]}"#);
        assert_eq!(identify_payload(&payload).map(|id| id.as_str()), Some("envelope"));
    }
}
