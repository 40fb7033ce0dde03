//! Envelope entity objects and their mapping.
//!
//! Recognized `"type"` values and their wire fields (optional unless noted):
//! - `post` / `status_message`: `guid`, `text`, `public`, `created_at`,
//!   `provider_display_name`, `location`, `photos`
//! - `photo`: `guid`, `text`, `public`, `created_at`, `remote_photo_path`,
//!   `remote_photo_name`, `status_message_guid`, `height`, `width`
//! - `comment`: `guid`, `parent_guid`, `text`, `created_at`
//! - `like`: `guid`, `parent_guid`, `created_at`
//! - `request`: `recipient`, `relationship` (required), `created_at`
//! - `profile`: `guid`, `name`, `email`, `image_url`, `image_url_medium`,
//!   `image_url_small`, `gender`, `location`, `nsfw`, `tag_string`,
//!   `public_key`, `bio`, `searchable`, `created_at`
//! - `retraction`: `target_guid`, `target_type`, `created_at`
//!
//! The envelope sender is the author (`handle`) of every entity.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;

use crate::entities::{
    Comment, Entity, EntityKind, Image, ImageUrls, Post, Profile, Reaction, ReactionKind,
    Relationship, RelationshipKind, Retraction,
};
use crate::mappers::{EntityMapper, MapError, keep_valid};
use crate::protocols::envelope::EnvelopeMessage;

const TYPE_KEY: &str = "type";
const PHOTO_LINKED_TYPE: &str = "Post";

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeMapper;

impl EntityMapper for EnvelopeMapper {
    type Message = EnvelopeMessage;

    fn map(&self, message: EnvelopeMessage) -> Result<Vec<Entity>, MapError> {
        let handle = message.sender.as_str();
        let mut entities = Vec::with_capacity(message.entities.len());
        for (index, value) in message.entities.into_iter().enumerate() {
            if !value.is_object() {
                return Err(MapError::NotAnObject { index });
            }
            let Some(kind) = value.get(TYPE_KEY).and_then(Value::as_str) else {
                warn!(index, "skipping entity without a type");
                continue;
            };
            let kind = kind.to_string();
            let entity = match kind.as_str() {
                "post" | "status_message" => decode::<WirePost>(index, &kind, value)?.into_entity(handle),
                "photo" => Entity::Image(decode::<WirePhoto>(index, &kind, value)?.into_image(handle, None)),
                "comment" => decode::<WireComment>(index, &kind, value)?.into_entity(handle),
                "like" => decode::<WireLike>(index, &kind, value)?.into_entity(handle),
                "request" => decode::<WireRequest>(index, &kind, value)?.into_entity(handle),
                "profile" => decode::<WireProfile>(index, &kind, value)?.into_entity(handle),
                "retraction" => decode::<WireRetraction>(index, &kind, value)?.into_entity(handle),
                _ => {
                    warn!(index, kind = kind.as_str(), "skipping entity of unknown type");
                    continue;
                }
            };
            entities.push(entity);
        }
        Ok(keep_valid(entities))
    }
}

fn decode<T: DeserializeOwned>(index: usize, kind: &str, value: Value) -> Result<T, MapError> {
    serde_json::from_value(value).map_err(|source| MapError::InvalidEntity {
        index,
        kind: kind.to_string(),
        source,
    })
}

fn created_at(value: Option<OffsetDateTime>) -> OffsetDateTime {
    value.unwrap_or_else(OffsetDateTime::now_utc)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePost {
    guid: String,
    text: String,
    public: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    provider_display_name: String,
    location: String,
    photos: Vec<WirePhoto>,
}

impl WirePost {
    fn into_entity(self, handle: &str) -> Entity {
        let photos = self
            .photos
            .into_iter()
            .map(|photo| {
                let mut image = photo.into_image(handle, Some(&self.guid));
                image.public = self.public;
                image
            })
            .collect();
        Entity::Post(Post {
            guid: self.guid,
            handle: handle.to_string(),
            raw_content: self.text,
            public: self.public,
            created_at: created_at(self.created_at),
            provider_display_name: self.provider_display_name,
            location: self.location,
            photos,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePhoto {
    guid: String,
    text: String,
    public: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    remote_photo_path: String,
    remote_photo_name: String,
    status_message_guid: String,
    height: u32,
    width: u32,
}

impl WirePhoto {
    /// `parent_guid` links the image to an enclosing post.
    fn into_image(self, handle: &str, parent_guid: Option<&str>) -> Image {
        let linked_guid = parent_guid
            .map(str::to_string)
            .unwrap_or(self.status_message_guid);
        let linked_type = if linked_guid.is_empty() {
            String::new()
        } else {
            PHOTO_LINKED_TYPE.to_string()
        };
        Image {
            guid: self.guid,
            handle: handle.to_string(),
            public: self.public,
            raw_content: self.text,
            created_at: created_at(self.created_at),
            remote_path: self.remote_photo_path,
            remote_name: self.remote_photo_name,
            linked_type,
            linked_guid,
            height: self.height,
            width: self.width,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireComment {
    guid: String,
    parent_guid: String,
    text: String,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl WireComment {
    fn into_entity(self, handle: &str) -> Entity {
        Entity::Comment(Comment {
            guid: self.guid,
            target_guid: self.parent_guid,
            handle: handle.to_string(),
            raw_content: self.text,
            created_at: created_at(self.created_at),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLike {
    guid: String,
    parent_guid: String,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl WireLike {
    fn into_entity(self, handle: &str) -> Entity {
        Entity::Reaction(Reaction {
            guid: self.guid,
            target_guid: self.parent_guid,
            handle: handle.to_string(),
            reaction: ReactionKind::Like,
            created_at: created_at(self.created_at),
        })
    }
}

/// `relationship` has no default; a request must say what it asks for.
#[derive(Debug, Deserialize)]
struct WireRequest {
    #[serde(default)]
    recipient: String,
    relationship: RelationshipKind,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl WireRequest {
    fn into_entity(self, handle: &str) -> Entity {
        Entity::Relationship(Relationship {
            handle: handle.to_string(),
            target_handle: self.recipient,
            relationship: self.relationship,
            created_at: created_at(self.created_at),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireProfile {
    guid: String,
    name: String,
    email: String,
    image_url: String,
    image_url_medium: String,
    image_url_small: String,
    gender: String,
    location: String,
    nsfw: bool,
    tag_string: String,
    public_key: String,
    bio: String,
    searchable: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl WireProfile {
    fn into_entity(self, handle: &str) -> Entity {
        let tag_list = self
            .tag_string
            .split_whitespace()
            .map(|tag| tag.trim_start_matches('#').to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        Entity::Profile(Profile {
            guid: self.guid,
            handle: handle.to_string(),
            name: self.name,
            email: self.email,
            image_urls: ImageUrls {
                small: self.image_url_small,
                medium: self.image_url_medium,
                large: self.image_url,
            },
            gender: self.gender,
            location: self.location,
            nsfw: self.nsfw,
            tag_list,
            public_key: self.public_key,
            raw_content: self.bio,
            public: self.searchable,
            created_at: created_at(self.created_at),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireRetraction {
    #[serde(default)]
    target_guid: String,
    target_type: EntityKind,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl WireRetraction {
    fn into_entity(self, handle: &str) -> Entity {
        Entity::Retraction(Retraction {
            handle: handle.to_string(),
            target_guid: self.target_guid,
            entity_type: self.target_type,
            created_at: created_at(self.created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::macros::datetime;

    use super::EnvelopeMapper;
    use crate::SenderHandle;
    use crate::entities::{Entity, EntityKind, RelationshipKind};
    use crate::mappers::{EntityMapper, MapError};
    use crate::protocols::envelope::EnvelopeMessage;

    const GUID: &str = "0123456789abcdef";
    const PARENT: &str = "fedcba9876543210";

    fn message(entities: Vec<Value>) -> EnvelopeMessage {
        EnvelopeMessage {
            sender: SenderHandle::new("alice@example.com"),
            recipient: None,
            entities,
        }
    }

    #[test]
    fn maps_post_with_photos() {
        let entities = EnvelopeMapper
            .map(message(vec![json!({
                "type": "status_message",
                "guid": GUID,
                "text": "look #cats",
                "public": true,
                "created_at": "2024-05-01T12:00:00Z",
                "photos": [{
                    "guid": PARENT,
                    "remote_photo_path": "https://example.com/uploads/",
                    "remote_photo_name": "cat.jpg",
                    "height": 120,
                    "width": 80
                }]
            })]))
            .unwrap();

        let [Entity::Post(post)] = entities.as_slice() else {
            panic!("expected one post, got {entities:?}");
        };
        assert_eq!(post.handle, "alice@example.com");
        assert_eq!(post.created_at, datetime!(2024-05-01 12:00:00 UTC));
        let photo = &post.photos[0];
        assert_eq!(photo.handle, "alice@example.com");
        assert_eq!(photo.linked_type, "Post");
        assert_eq!(photo.linked_guid, GUID);
        assert!(photo.public);
        assert_eq!((photo.height, photo.width), (120, 80));
    }

    #[test]
    fn maps_participations_and_relationships() {
        let entities = EnvelopeMapper
            .map(message(vec![
                json!({"type": "comment", "guid": GUID, "parent_guid": PARENT, "text": "nice"}),
                json!({"type": "like", "guid": GUID, "parent_guid": PARENT}),
                json!({"type": "request", "recipient": "bob@example.org", "relationship": "following"}),
                json!({"type": "retraction", "target_guid": PARENT, "target_type": "Photo"}),
            ]))
            .unwrap();

        let kinds: Vec<EntityKind> = entities.iter().map(Entity::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Comment,
                EntityKind::Reaction,
                EntityKind::Relationship,
                EntityKind::Retraction
            ]
        );
        let Entity::Relationship(relationship) = &entities[2] else {
            panic!("expected a relationship");
        };
        assert_eq!(relationship.relationship, RelationshipKind::Following);
        let Entity::Retraction(retraction) = &entities[3] else {
            panic!("expected a retraction");
        };
        assert_eq!(retraction.entity_type, EntityKind::Image);
    }

    #[test]
    fn maps_profile_tags_and_images() {
        let entities = EnvelopeMapper
            .map(message(vec![json!({
                "type": "profile",
                "guid": GUID,
                "name": "Alice",
                "image_url": "https://example.com/l.png",
                "image_url_small": "https://example.com/s.png",
                "tag_string": "#Rust #federation",
                "searchable": true
            })]))
            .unwrap();

        let [Entity::Profile(profile)] = entities.as_slice() else {
            panic!("expected one profile, got {entities:?}");
        };
        assert_eq!(profile.tag_list, vec!["rust", "federation"]);
        assert_eq!(profile.image_urls.large, "https://example.com/l.png");
        assert_eq!(profile.image_urls.small, "https://example.com/s.png");
        assert!(profile.public);
    }

    #[test]
    fn skips_unknown_and_invalid_entities() {
        let entities = EnvelopeMapper
            .map(message(vec![
                json!({"type": "poll", "guid": GUID}),
                json!({"guid": GUID}),
                json!({"type": "post", "guid": "short", "text": "hi"}),
                json!({"type": "post", "guid": GUID, "text": "kept"}),
            ]))
            .unwrap();

        assert_eq!(entities.len(), 1);
        assert!(matches!(&entities[0], Entity::Post(post) if post.raw_content == "kept"));
    }

    #[test]
    fn rejects_non_object_entries() {
        let err = EnvelopeMapper
            .map(message(vec![json!({"type": "post"}), json!("post")]))
            .unwrap_err();
        assert!(matches!(err, MapError::NotAnObject { index: 1 }));
    }

    #[test]
    fn request_without_relationship_is_not_mapped() {
        let err = EnvelopeMapper
            .map(message(vec![json!({"type": "request", "recipient": "bob@example.org"})]))
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidEntity { index: 0, ref kind, .. } if kind == "request"));
    }

    #[test]
    fn rejects_undecodable_known_entities() {
        let err = EnvelopeMapper
            .map(message(vec![json!({"type": "request", "relationship": "friends"})]))
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidEntity { index: 0, ref kind, .. } if kind == "request"));
    }
}
