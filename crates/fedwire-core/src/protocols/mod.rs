//! Wire protocol plugins.
//!
//! A protocol recognizes its own envelope (`identify`) and decodes it into a
//! sender plus a protocol-specific message (`receive`). The dispatcher only
//! sees this contract; each built-in protocol follows the same layering:
//! - `layout`: separators, keys and constants of the wire format
//! - `reader`/`parser`: decoding into a typed envelope (no crypto)
//! - `error`: explicit decoding errors, folded into `ProtocolError`
//!
//! Author verification and recipient checks are shared in `common` so every
//! protocol enforces them the same way.
//!
//! Version française (résumé):
//! Chaque protocole sait reconnaître son enveloppe (`identify`) et la décoder
//! (`receive`) en un expéditeur et un message propre au protocole. La
//! vérification d'auteur est commune à tous les protocoles.

use std::fmt;

use crate::keys::PublicKey;
use crate::{LocalUser, Payload, ProtocolId, SenderHandle};

pub(crate) mod common;
pub mod envelope;
pub mod error;
pub mod plain;

pub use envelope::EnvelopeProtocol;
pub use error::ProtocolError;
pub use plain::PlainProtocol;

/// Contract every wire-format plugin implements.
pub trait Protocol: Send + Sync {
    /// Decoded message handed verbatim to the paired entity mapper.
    type Message;

    fn id(&self) -> ProtocolId;

    /// Cheap structural sniff. Must not fail or panic on arbitrary input and
    /// must not perform any cryptographic work.
    fn identify(&self, payload: &Payload) -> bool;

    /// Full decode, recipient check and author verification.
    fn receive(
        &self,
        payload: &Payload,
        context: &ReceiveContext<'_>,
    ) -> Result<(SenderHandle, Self::Message), ProtocolError>;
}

/// Resolves a sender handle to its public key, typically over the network.
pub trait SenderKeyFetcher: Send + Sync {
    fn fetch(&self, sender: &SenderHandle) -> Option<PublicKey>;
}

impl<F> SenderKeyFetcher for F
where
    F: Fn(&SenderHandle) -> Option<PublicKey> + Send + Sync,
{
    fn fetch(&self, sender: &SenderHandle) -> Option<PublicKey> {
        self(sender)
    }
}

/// Caller-supplied inputs forwarded untouched to `Protocol::receive`.
///
/// # Examples
/// ```
/// use fedwire_core::{LocalUser, ReceiveContext};
///
/// let user = LocalUser::new("bob@example.org");
/// let context = ReceiveContext::new().with_user(&user);
/// assert!(!context.skip_author_verification);
/// assert_eq!(context.user.map(|u| u.handle()), Some("bob@example.org"));
/// ```
#[derive(Clone, Copy, Default)]
pub struct ReceiveContext<'a> {
    /// Local identity the payload may be addressed to.
    pub user: Option<&'a LocalUser>,
    /// Key lookup used for author verification.
    pub sender_key_fetcher: Option<&'a dyn SenderKeyFetcher>,
    /// Disables author verification. Test use only.
    pub skip_author_verification: bool,
}

impl<'a> ReceiveContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: &'a LocalUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_sender_key_fetcher(mut self, fetcher: &'a dyn SenderKeyFetcher) -> Self {
        self.sender_key_fetcher = Some(fetcher);
        self
    }

    pub fn with_author_verification_skipped(mut self, skip: bool) -> Self {
        self.skip_author_verification = skip;
        self
    }
}

impl fmt::Debug for ReceiveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveContext")
            .field("user", &self.user)
            .field("sender_key_fetcher", &self.sender_key_fetcher.is_some())
            .field("skip_author_verification", &self.skip_author_verification)
            .finish()
    }
}
