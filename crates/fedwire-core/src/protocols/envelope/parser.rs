use serde::Deserialize;
use serde_json::Value;

use super::error::EnvelopeError;
use super::layout;
use crate::protocols::common::optional_non_empty;

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    recipient: Option<String>,
    entities: Vec<Value>,
    #[serde(default)]
    signature: Option<String>,
}

fn default_version() -> u32 {
    layout::SUPPORTED_VERSION
}

/// Decoded envelope; entity objects stay untyped until mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub sender: String,
    pub recipient: Option<String>,
    pub entities: Vec<Value>,
    pub signature: Option<String>,
}

pub fn parse_envelope(payload: &[u8]) -> Result<Envelope, EnvelopeError> {
    let wire: WireEnvelope = serde_json::from_slice(payload)?;
    if wire.version != layout::SUPPORTED_VERSION {
        return Err(EnvelopeError::UnsupportedVersion {
            version: wire.version,
        });
    }
    let sender = optional_non_empty(wire.sender.as_deref())
        .ok_or(EnvelopeError::MissingSender)?
        .to_string();
    let recipient = optional_non_empty(wire.recipient.as_deref()).map(str::to_string);

    Ok(Envelope {
        sender,
        recipient,
        entities: wire.entities,
        signature: wire.signature,
    })
}

/// Structural sniff: a JSON object mentioning an `entities` key.
pub fn looks_like_envelope(payload: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(payload) else {
        return false;
    };
    text.trim_start().starts_with(layout::OBJECT_START) && text.contains(layout::ENTITIES_KEY)
}

/// Bytes covered by an envelope signature:
/// `sender \n recipient \n canonical(entities)`.
///
/// Canonical JSON is compact with object keys sorted at every level, so the
/// signature does not depend on how the sender ordered its keys.
pub fn signing_input(sender: &str, recipient: Option<&str>, entities: &[Value]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(sender);
    out.push(layout::SIGNING_SEPARATOR);
    out.push_str(recipient.unwrap_or_default());
    out.push(layout::SIGNING_SEPARATOR);
    out.push('[');
    for (index, entity) in entities.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_canonical(entity, &mut out);
    }
    out.push(']');
    out.into_bytes()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
