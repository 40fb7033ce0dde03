//! fedwire core library: inbound protocol identification and dispatch.
//!
//! A payload received from a remote peer is matched against an ordered
//! registry of wire protocols. The first protocol whose `identify` claims the
//! payload decodes it (`receive`), checking the recipient and the author's
//! signature, and its paired mapper turns the protocol message into
//! normalized entities. The dispatcher itself parses nothing and performs no
//! cryptography; it only orchestrates the protocol plugins.
//!
//! Invariants:
//! - Exactly one protocol is selected per payload (first match wins).
//! - Without a match, no `receive` or mapper call happens.
//! - The receive context reaches `receive` unmodified.
//!
//! Version française (résumé):
//! Cette crate identifie le protocole d'une charge utile entrante, délègue
//! sa réception (vérification d'auteur, destinataire) au protocole choisi,
//! puis convertit le message en entités normalisées via le mapper associé.
//! Le premier protocole reconnu dans l'ordre du registre l'emporte.
//!
//! # Examples
//! ```
//! use fedwire_core::entities::Entity;
//! use fedwire_core::{Payload, ReceiveContext, handle_receive};
//!
//! let payload = Payload::from("alice@example.com;PUBLIC;hello world");
//! let context = ReceiveContext::new().with_author_verification_skipped(true);
//! let result = handle_receive(&payload, &context)?;
//! match result.entities.as_slice() {
//!     [Entity::Post(post)] => assert_eq!(post.raw_content, "hello world"),
//!     other => panic!("unexpected entities: {other:?}"),
//! }
//! # Ok::<(), fedwire_core::DispatchError>(())
//! ```

use std::fmt;

use serde::Serialize;

pub mod dispatch;
pub mod entities;
pub mod keys;
pub mod mappers;
pub mod protocols;
pub mod registry;

pub use dispatch::{
    DispatchError, DispatchResult, handle_receive, handle_receive_with, identify_payload,
    identify_payload_with,
};
pub use entities::Entity;
pub use keys::{KeyError, KeyStore, KeyStoreError, PublicKey};
pub use mappers::{EntityMapper, MapError};
pub use protocols::{Protocol, ProtocolError, ReceiveContext, SenderKeyFetcher};
pub use registry::{ProtocolRegistry, Registration, RegistryError, default_registry};

/// Opaque inbound payload bytes.
///
/// # Examples
/// ```
/// use fedwire_core::Payload;
///
/// let payload = Payload::from("hello");
/// assert_eq!(payload.as_str(), Some("hello"));
/// assert_eq!(Payload::from(vec![0xff]).as_str(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view, if the payload is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// Stable protocol identifier, serialized as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProtocolId(&'static str);

impl ProtocolId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Federated address of a remote sender, e.g. `alice@example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SenderHandle(String);

impl SenderHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local identity a payload may be addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    handle: String,
}

impl LocalUser {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }
}
