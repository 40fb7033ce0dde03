use super::error::PlainError;
use super::layout;
use super::reader::PlainReader;
use crate::entities::is_valid_handle;
use crate::protocols::common::optional_non_empty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private { recipient: String },
}

impl Visibility {
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Visibility::Public => None,
            Visibility::Private { recipient } => Some(recipient),
        }
    }
}

/// Decoded plain envelope, borrowing from the payload.
#[derive(Debug)]
pub struct PlainEnvelope<'a> {
    pub sender: &'a str,
    pub visibility: Visibility,
    pub text: &'a str,
    /// Bytes covered by the signature.
    pub signed: &'a str,
    pub signature: Option<&'a str>,
}

pub fn parse_plain(payload: &[u8]) -> Result<PlainEnvelope<'_>, PlainError> {
    let reader = PlainReader::from_bytes(payload)?;
    let (sender, visibility, text) = reader.read_fields()?;
    if sender.trim().is_empty() {
        return Err(PlainError::EmptySender);
    }
    let visibility = parse_visibility(visibility)?;
    let (signed, signature) = reader.split_signature();

    Ok(PlainEnvelope {
        sender,
        visibility,
        text,
        signed,
        signature,
    })
}

/// Structural sniff: handle-shaped sender and a known visibility marker.
pub fn looks_like_plain(payload: &[u8]) -> bool {
    let Ok(reader) = PlainReader::from_bytes(payload) else {
        return false;
    };
    let Ok((sender, visibility, _)) = reader.read_fields() else {
        return false;
    };
    is_valid_handle(sender)
        && (visibility == layout::VISIBILITY_PUBLIC
            || visibility.starts_with(layout::VISIBILITY_PRIVATE_PREFIX))
}

fn parse_visibility(value: &str) -> Result<Visibility, PlainError> {
    if value == layout::VISIBILITY_PUBLIC {
        return Ok(Visibility::Public);
    }
    let recipient = value
        .strip_prefix(layout::VISIBILITY_PRIVATE_PREFIX)
        .ok_or_else(|| PlainError::InvalidVisibility {
            value: value.to_string(),
        })?;
    optional_non_empty(Some(recipient))
        .map(|recipient| Visibility::Private {
            recipient: recipient.to_string(),
        })
        .ok_or(PlainError::EmptyRecipient)
}

#[cfg(test)]
mod tests {
    use super::{Visibility, looks_like_plain, parse_plain};
    use crate::protocols::plain::error::PlainError;

    #[test]
    fn parse_public_payload() {
        let parsed = parse_plain(b"alice@example.com;PUBLIC;hello world").unwrap();
        assert_eq!(parsed.sender, "alice@example.com");
        assert_eq!(parsed.visibility, Visibility::Public);
        assert_eq!(parsed.text, "hello world");
        assert_eq!(parsed.signature, None);
    }

    #[test]
    fn parse_private_signed_payload() {
        let signature = "00ff".repeat(32);
        let line = format!("alice@example.com;PRIVATE:bob@example.org;hi;sig={signature}");
        let parsed = parse_plain(line.as_bytes()).unwrap();
        assert_eq!(parsed.visibility.recipient(), Some("bob@example.org"));
        assert_eq!(parsed.text, "hi");
        assert_eq!(parsed.signed, "alice@example.com;PRIVATE:bob@example.org;hi");
        assert_eq!(parsed.signature, Some(signature.as_str()));
    }

    #[test]
    fn parse_invalid_visibility() {
        let err = parse_plain(b"alice@example.com;FRIENDS;hi").unwrap_err();
        assert!(matches!(err, PlainError::InvalidVisibility { .. }));
    }

    #[test]
    fn parse_private_without_recipient() {
        let err = parse_plain(b"alice@example.com;PRIVATE:;hi").unwrap_err();
        assert!(matches!(err, PlainError::EmptyRecipient));
    }

    #[test]
    fn identify_accepts_only_plain_shapes() {
        assert!(looks_like_plain(b"alice@example.com;PUBLIC;hello world"));
        assert!(looks_like_plain(b"alice@example.com;PRIVATE:;hello"));
        assert!(!looks_like_plain(b"alice;PUBLIC;hello"));
        assert!(!looks_like_plain(b"alice@example.com;FRIENDS;hello"));
        assert!(!looks_like_plain(b"{\"entities\": []}"));
        assert!(!looks_like_plain(&[0xff, 0x00, 0x3b]));
        assert!(!looks_like_plain(b""));
        assert!(looks_like_plain(b"alice@example.com;PUBLIC;sig=abc"));
    }
}
