//! Entity mappers: protocol messages to normalized entities.
//!
//! Each built-in protocol has exactly one mapper whose `Message` type matches
//! the protocol's, so the registry can pair them at compile time.
//!
//! Skipping rules:
//! - entity objects of an unknown or missing type are skipped (`warn!`);
//! - decoded entities failing `Entity::validate` are skipped (`error!`);
//! - entries that are not objects, or known objects that cannot be decoded,
//!   fail the whole message with `MapError`.
//!
//! Version française (résumé):
//! Un mapper par protocole transforme le message reçu en entités normalisées.
//! Les entités inconnues ou invalides sont ignorées et journalisées.

use thiserror::Error;
use tracing::error;

use crate::entities::Entity;

pub mod envelope;
pub mod plain;

pub use envelope::EnvelopeMapper;
pub use plain::PlainMapper;

/// Translates one protocol's received message into entities.
pub trait EntityMapper: Send + Sync {
    type Message;

    fn map(&self, message: Self::Message) -> Result<Vec<Entity>, MapError>;
}

/// Errors raised while mapping a received message.
///
/// # Examples
/// ```
/// use fedwire_core::MapError;
///
/// let err = MapError::NotAnObject { index: 2 };
/// assert_eq!(err.to_string(), "entity 2 is not a JSON object");
/// ```
#[derive(Debug, Error)]
pub enum MapError {
    #[error("entity {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("entity {index} ({kind}) could not be decoded: {source}")]
    InvalidEntity {
        index: usize,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Drop entities that fail semantic validation, logging each one.
pub(crate) fn keep_valid(entities: Vec<Entity>) -> Vec<Entity> {
    entities
        .into_iter()
        .filter(|entity| match entity.validate() {
            Ok(()) => true,
            Err(err) => {
                error!(
                    kind = %entity.kind(),
                    handle = entity.handle(),
                    error = %err,
                    "skipping invalid entity"
                );
                false
            }
        })
        .collect()
}
