use time::OffsetDateTime;

use crate::entities::{Entity, Post};
use crate::mappers::{EntityMapper, MapError, keep_valid};
use crate::protocols::plain::PlainMessage;

/// Maps a plain line message to a single post.
///
/// The post guid is the message digest, so the same signed line always maps
/// to the same guid.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainMapper;

impl EntityMapper for PlainMapper {
    type Message = PlainMessage;

    fn map(&self, message: PlainMessage) -> Result<Vec<Entity>, MapError> {
        let post = Post {
            guid: message.digest,
            handle: message.sender.to_string(),
            raw_content: message.text,
            public: message.public,
            created_at: OffsetDateTime::now_utc(),
            ..Post::default()
        };
        Ok(keep_valid(vec![Entity::Post(post)]))
    }
}

#[cfg(test)]
mod tests {
    use super::PlainMapper;
    use crate::SenderHandle;
    use crate::entities::Entity;
    use crate::mappers::EntityMapper;
    use crate::protocols::plain::PlainMessage;

    fn message(text: &str) -> PlainMessage {
        PlainMessage {
            sender: SenderHandle::new("alice@example.com"),
            public: true,
            text: text.to_string(),
            digest: "9f86d081884c7d659a2feaa0c55ad015".to_string(),
        }
    }

    #[test]
    fn maps_message_to_post() {
        let entities = PlainMapper.map(message("hello #fediverse")).unwrap();
        let [Entity::Post(post)] = entities.as_slice() else {
            panic!("expected one post, got {entities:?}");
        };
        assert_eq!(post.handle, "alice@example.com");
        assert_eq!(post.raw_content, "hello #fediverse");
        assert_eq!(post.guid, "9f86d081884c7d659a2feaa0c55ad015");
        assert!(post.public);
        assert!(post.tags().contains("fediverse"));
    }

    #[test]
    fn empty_text_is_skipped() {
        let entities = PlainMapper.map(message("   ")).unwrap();
        assert!(entities.is_empty());
    }
}
