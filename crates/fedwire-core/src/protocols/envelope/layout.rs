pub const SUPPORTED_VERSION: u32 = 1;

/// Marker a payload must contain to be considered an envelope.
pub const ENTITIES_KEY: &str = "\"entities\"";
pub const OBJECT_START: char = '{';

pub const SIGNING_SEPARATOR: char = '\n';
