use super::error::PlainError;
use super::layout;

/// Field access over a plain envelope line.
pub struct PlainReader<'a> {
    text: &'a str,
}

impl<'a> PlainReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, PlainError> {
        std::str::from_utf8(bytes)
            .map(Self::new)
            .map_err(|_| PlainError::NotUtf8)
    }

    pub fn field_count(&self) -> usize {
        self.text.split(layout::FIELD_SEPARATOR).count()
    }

    pub fn require_fields(&self, needed: usize) -> Result<(), PlainError> {
        let actual = self.field_count();
        if actual < needed {
            return Err(PlainError::MissingFields { needed, actual });
        }
        Ok(())
    }

    /// Split off a trailing signature, returning the signed part and the
    /// signature when present.
    ///
    /// Only a last `;sig=` field holding exactly `SIGNATURE_HEX_LEN` hex
    /// digits counts; anything else stays part of the text.
    pub fn split_signature(&self) -> (&'a str, Option<&'a str>) {
        match self.text.rsplit_once(layout::SIGNATURE_MARKER) {
            Some((signed, signature)) if is_signature_field(signature) => {
                (signed, Some(signature))
            }
            _ => (self.text, None),
        }
    }

    /// `(sender, visibility, text)` of the signed part.
    pub fn read_fields(&self) -> Result<(&'a str, &'a str, &'a str), PlainError> {
        self.require_fields(layout::MIN_FIELDS)?;
        let (signed, _) = self.split_signature();
        let mut fields = signed.splitn(layout::MIN_FIELDS, layout::FIELD_SEPARATOR);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(sender), Some(visibility), Some(text)) => Ok((sender, visibility, text)),
            _ => Err(PlainError::MissingFields {
                needed: layout::MIN_FIELDS,
                actual: signed.split(layout::FIELD_SEPARATOR).count(),
            }),
        }
    }
}

fn is_signature_field(value: &str) -> bool {
    value.len() == layout::SIGNATURE_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
