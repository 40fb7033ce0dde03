//! Normalized domain entities produced by entity mappers.
//!
//! Entities are protocol independent. Every entity carries the `handle` of
//! its author and a `created_at` timestamp (defaulting to the time of
//! mapping when the wire omits it). `Entity::validate` applies the semantic
//! rules mappers use to drop unusable entities.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod validate;

pub use validate::{MIN_GUID_LEN, ValidationError, is_valid_handle, tags_in};
use validate::{optional_email, require, require_guid, require_handle};

/// A normalized entity, serialized with a `type` tag.
///
/// # Examples
/// ```
/// use fedwire_core::entities::{Entity, EntityKind, Post};
///
/// let post = Entity::Post(Post {
///     guid: "0123456789abcdef".to_string(),
///     handle: "alice@example.com".to_string(),
///     raw_content: "hello #world".to_string(),
///     ..Post::default()
/// });
/// assert_eq!(post.kind(), EntityKind::Post);
/// assert!(post.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Post(Post),
    Image(Image),
    Comment(Comment),
    Reaction(Reaction),
    Relationship(Relationship),
    Profile(Profile),
    Retraction(Retraction),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Post(_) => EntityKind::Post,
            Entity::Image(_) => EntityKind::Image,
            Entity::Comment(_) => EntityKind::Comment,
            Entity::Reaction(_) => EntityKind::Reaction,
            Entity::Relationship(_) => EntityKind::Relationship,
            Entity::Profile(_) => EntityKind::Profile,
            Entity::Retraction(_) => EntityKind::Retraction,
        }
    }

    pub fn handle(&self) -> &str {
        match self {
            Entity::Post(e) => &e.handle,
            Entity::Image(e) => &e.handle,
            Entity::Comment(e) => &e.handle,
            Entity::Reaction(e) => &e.handle,
            Entity::Relationship(e) => &e.handle,
            Entity::Profile(e) => &e.handle,
            Entity::Retraction(e) => &e.handle,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Entity::Post(e) => e.validate(),
            Entity::Image(e) => e.validate(),
            Entity::Comment(e) => e.validate(),
            Entity::Reaction(e) => e.validate(),
            Entity::Relationship(e) => e.validate(),
            Entity::Profile(e) => e.validate(),
            Entity::Retraction(e) => e.validate(),
        }
    }
}

/// Entity type names, as used by retractions.
///
/// Remote names `Like` and `Photo` are accepted for `Reaction` and `Image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Post,
    #[serde(alias = "Photo")]
    Image,
    Comment,
    #[serde(alias = "Like")]
    Reaction,
    Relationship,
    Profile,
    Retraction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Post => "Post",
            EntityKind::Image => "Image",
            EntityKind::Comment => "Comment",
            EntityKind::Reaction => "Reaction",
            EntityKind::Relationship => "Relationship",
            EntityKind::Profile => "Profile",
            EntityKind::Retraction => "Retraction",
        };
        f.write_str(name)
    }
}

/// A post or status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub guid: String,
    pub handle: String,
    pub raw_content: String,
    pub public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub provider_display_name: String,
    pub location: String,
    /// Attached images; only images may be children of a post.
    pub photos: Vec<Image>,
}

impl Default for Post {
    fn default() -> Self {
        Self {
            guid: String::new(),
            handle: String::new(),
            raw_content: String::new(),
            public: false,
            created_at: OffsetDateTime::now_utc(),
            provider_display_name: String::new(),
            location: String::new(),
            photos: Vec::new(),
        }
    }
}

impl Post {
    pub fn tags(&self) -> BTreeSet<String> {
        tags_in(&self.raw_content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_guid("guid", &self.guid)?;
        require_handle("handle", &self.handle)?;
        require("raw_content", &self.raw_content)?;
        for (index, photo) in self.photos.iter().enumerate() {
            photo
                .validate()
                .map_err(|source| ValidationError::InvalidPhoto {
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

/// A single image, possibly linked to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub guid: String,
    pub handle: String,
    pub public: bool,
    pub raw_content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub remote_path: String,
    pub remote_name: String,
    pub linked_type: String,
    pub linked_guid: String,
    pub height: u32,
    pub width: u32,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            guid: String::new(),
            handle: String::new(),
            public: false,
            raw_content: String::new(),
            created_at: OffsetDateTime::now_utc(),
            remote_path: String::new(),
            remote_name: String::new(),
            linked_type: String::new(),
            linked_guid: String::new(),
            height: 0,
            width: 0,
        }
    }
}

impl Image {
    pub fn tags(&self) -> BTreeSet<String> {
        tags_in(&self.raw_content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_guid("guid", &self.guid)?;
        require_handle("handle", &self.handle)?;
        require("remote_path", &self.remote_path)?;
        require("remote_name", &self.remote_name)
    }
}

/// A comment on another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub guid: String,
    pub target_guid: String,
    pub handle: String,
    pub raw_content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub fn tags(&self) -> BTreeSet<String> {
        tags_in(&self.raw_content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_guid("guid", &self.guid)?;
        require_guid("target_guid", &self.target_guid)?;
        require_handle("handle", &self.handle)?;
        require("raw_content", &self.raw_content)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    #[default]
    Like,
}

/// A reaction to another entity, for example a like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub guid: String,
    pub target_guid: String,
    pub handle: String,
    pub reaction: ReactionKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Reaction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_guid("guid", &self.guid)?;
        require_guid("target_guid", &self.target_guid)?;
        require_handle("handle", &self.handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Sharing,
    Following,
    Ignoring,
    Blocking,
}

/// A relationship between two handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub handle: String,
    pub target_handle: String,
    pub relationship: RelationshipKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Relationship {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_handle("handle", &self.handle)?;
        require_handle("target_handle", &self.target_handle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub guid: String,
    pub handle: String,
    pub name: String,
    pub email: String,
    pub image_urls: ImageUrls,
    pub gender: String,
    pub location: String,
    pub nsfw: bool,
    pub tag_list: Vec<String>,
    pub public_key: String,
    /// Free-form bio.
    pub raw_content: String,
    pub public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Profile {
    pub fn tags(&self) -> BTreeSet<String> {
        tags_in(&self.raw_content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_guid("guid", &self.guid)?;
        require_handle("handle", &self.handle)?;
        optional_email("email", &self.email)
    }
}

/// Retraction of previously published content by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retraction {
    pub handle: String,
    pub target_guid: String,
    pub entity_type: EntityKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Retraction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_handle("handle", &self.handle)?;
        require_guid("target_guid", &self.target_guid)
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::{
        Comment, Entity, EntityKind, Image, Post, Profile, Reaction, ReactionKind, Relationship,
        RelationshipKind, Retraction, ValidationError,
    };

    const GUID: &str = "0123456789abcdef";

    fn post() -> Post {
        Post {
            guid: GUID.to_string(),
            handle: "alice@example.com".to_string(),
            raw_content: "hello #World #rust".to_string(),
            public: true,
            ..Post::default()
        }
    }

    fn image() -> Image {
        Image {
            guid: GUID.to_string(),
            handle: "alice@example.com".to_string(),
            remote_path: "https://example.com/uploads/".to_string(),
            remote_name: "cat.jpg".to_string(),
            ..Image::default()
        }
    }

    #[test]
    fn post_tags() {
        let tags = post().tags();
        assert!(tags.contains("world"));
        assert!(tags.contains("rust"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn post_requires_content() {
        let mut post = post();
        post.raw_content = "  ".to_string();
        assert_eq!(
            post.validate(),
            Err(ValidationError::Required {
                field: "raw_content"
            })
        );
    }

    #[test]
    fn post_validates_photos() {
        let mut post = post();
        let mut photo = image();
        photo.remote_name.clear();
        post.photos.push(image());
        post.photos.push(photo);

        let err = post.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhoto { index: 1, .. }));
    }

    #[test]
    fn comment_requires_long_target_guid() {
        let comment = Comment {
            guid: GUID.to_string(),
            target_guid: "short".to_string(),
            handle: "alice@example.com".to_string(),
            raw_content: "nice".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(
            comment.validate(),
            Err(ValidationError::TooShort {
                field: "target_guid",
                min: 16
            })
        );
    }

    #[test]
    fn relationship_checks_target_handle() {
        let relationship = Relationship {
            handle: "alice@example.com".to_string(),
            target_handle: "bob".to_string(),
            relationship: RelationshipKind::Following,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(
            relationship.validate(),
            Err(ValidationError::InvalidHandle {
                field: "target_handle"
            })
        );
    }

    #[test]
    fn profile_email_optional_but_checked() {
        let mut profile = Profile {
            guid: GUID.to_string(),
            handle: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            email: String::new(),
            image_urls: Default::default(),
            gender: String::new(),
            location: String::new(),
            nsfw: false,
            tag_list: Vec::new(),
            public_key: String::new(),
            raw_content: String::new(),
            public: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert!(profile.validate().is_ok());
        profile.email = "not-an-email".to_string();
        assert_eq!(
            profile.validate(),
            Err(ValidationError::InvalidEmail { field: "email" })
        );
    }

    #[test]
    fn entity_serializes_with_type_tag() {
        let mut post = post();
        post.created_at = OffsetDateTime::UNIX_EPOCH;
        let value = serde_json::to_value(Entity::Post(post)).expect("entity json");
        assert_eq!(value["type"], "post");
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
        assert_eq!(value["raw_content"], "hello #World #rust");
    }

    fn keys(entity: Entity) -> Vec<String> {
        let value = serde_json::to_value(entity).expect("entity json");
        let mut keys: Vec<String> = value.as_object().expect("object").keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn comment_and_reaction_serialize_their_fields_only() {
        let comment = Comment {
            guid: GUID.to_string(),
            target_guid: GUID.to_string(),
            handle: "alice@example.com".to_string(),
            raw_content: "nice".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(
            keys(Entity::Comment(comment)),
            ["created_at", "guid", "handle", "raw_content", "target_guid", "type"]
        );

        let reaction = Reaction {
            guid: GUID.to_string(),
            target_guid: GUID.to_string(),
            handle: "alice@example.com".to_string(),
            reaction: ReactionKind::Like,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(Entity::Reaction(reaction.clone())).expect("entity json");
        assert_eq!(value["reaction"], "like");
        assert_eq!(
            keys(Entity::Reaction(reaction)),
            ["created_at", "guid", "handle", "reaction", "target_guid", "type"]
        );
    }

    #[test]
    fn retraction_accepts_remote_type_names() {
        let kind: EntityKind = serde_json::from_str("\"Like\"").unwrap();
        assert_eq!(kind, EntityKind::Reaction);
        let kind: EntityKind = serde_json::from_str("\"Photo\"").unwrap();
        assert_eq!(kind, EntityKind::Image);

        let retraction = Retraction {
            handle: "alice@example.com".to_string(),
            target_guid: GUID.to_string(),
            entity_type: kind,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert!(Entity::Retraction(retraction).validate().is_ok());
    }
}
