//! Ordered registry of protocol/mapper pairs.
//!
//! Registration order is identification priority: the dispatcher asks each
//! protocol in turn and stops at the first one that claims the payload.
//! Pairing is checked at compile time (`M: EntityMapper<Message =
//! P::Message>`), so every registered protocol always has its mapper.
//!
//! Version française (résumé):
//! Registre ordonné associant chaque protocole à son mapper. L'ordre
//! d'enregistrement donne la priorité d'identification.

use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;

use crate::dispatch::{DispatchError, events};
use crate::entities::Entity;
use crate::mappers::{EntityMapper, EnvelopeMapper, PlainMapper};
use crate::protocols::{EnvelopeProtocol, PlainProtocol, Protocol, ReceiveContext};
use crate::{Payload, ProtocolId, SenderHandle};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("protocol {id} is already registered")]
    DuplicateProtocol { id: ProtocolId },
}

/// Type-erased protocol/mapper pair.
trait Route: Send + Sync {
    fn id(&self) -> ProtocolId;
    fn identify(&self, payload: &Payload) -> bool;
    fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, Vec<Entity>), DispatchError>;
}

struct Paired<P, M> {
    protocol: P,
    mapper: M,
}

impl<P, M> Route for Paired<P, M>
where
    P: Protocol,
    M: EntityMapper<Message = P::Message>,
{
    fn id(&self) -> ProtocolId {
        self.protocol.id()
    }

    fn identify(&self, payload: &Payload) -> bool {
        self.protocol.identify(payload)
    }

    fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, Vec<Entity>), DispatchError> {
        let (sender, message) = self.protocol.receive(payload, context)?;
        events::received(self.protocol.id(), &sender);
        let entities = self.mapper.map(message)?;
        Ok((sender, entities))
    }
}

/// One registered protocol together with its mapper.
pub struct Registration {
    route: Box<dyn Route>,
}

impl Registration {
    pub fn id(&self) -> ProtocolId {
        self.route.id()
    }

    pub fn identify(&self, payload: &Payload) -> bool {
        self.route.identify(payload)
    }

    /// Receive with the protocol, then map the message with its mapper.
    pub(crate) fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, Vec<Entity>), DispatchError> {
        self.route.receive(payload, context)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

/// Append-only, ordered list of registrations.
///
/// # Examples
/// ```
/// use fedwire_core::mappers::PlainMapper;
/// use fedwire_core::protocols::PlainProtocol;
/// use fedwire_core::{ProtocolRegistry, RegistryError};
///
/// let registry = ProtocolRegistry::new().register(PlainProtocol, PlainMapper)?;
/// assert_eq!(registry.len(), 1);
///
/// let err = registry.register(PlainProtocol, PlainMapper).unwrap_err();
/// assert!(matches!(err, RegistryError::DuplicateProtocol { .. }));
/// # Ok::<(), RegistryError>(())
/// ```
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    registrations: Vec<Registration>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `protocol` paired with `mapper` at the lowest priority.
    pub fn register<P, M>(mut self, protocol: P, mapper: M) -> Result<Self, RegistryError>
    where
        P: Protocol + 'static,
        M: EntityMapper<Message = P::Message> + 'static,
    {
        let id = protocol.id();
        if self.get(id).is_some() {
            return Err(RegistryError::DuplicateProtocol { id });
        }
        self.push(protocol, mapper);
        Ok(self)
    }

    fn push<P, M>(&mut self, protocol: P, mapper: M)
    where
        P: Protocol + 'static,
        M: EntityMapper<Message = P::Message> + 'static,
    {
        self.registrations.push(Registration {
            route: Box::new(Paired { protocol, mapper }),
        });
    }

    /// Identifiers in priority order.
    pub fn ids(&self) -> Vec<ProtocolId> {
        self.registrations.iter().map(Registration::id).collect()
    }

    pub fn get(&self, id: ProtocolId) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProtocolRegistry {
    type Item = &'a Registration;
    type IntoIter = std::slice::Iter<'a, Registration>;

    fn into_iter(self) -> Self::IntoIter {
        self.registrations.iter()
    }
}

static DEFAULT_REGISTRY: LazyLock<ProtocolRegistry> = LazyLock::new(|| {
    let mut registry = ProtocolRegistry::new();
    // Envelope first: its sniff is the stricter of the two.
    registry.push(EnvelopeProtocol, EnvelopeMapper);
    registry.push(PlainProtocol, PlainMapper);
    registry
});

/// Built-in registry: `envelope`, then `plain`.
pub fn default_registry() -> &'static ProtocolRegistry {
    &DEFAULT_REGISTRY
}
