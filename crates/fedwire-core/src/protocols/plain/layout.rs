use crate::keys::SIGNATURE_LEN;

pub const FIELD_SEPARATOR: char = ';';
pub const SIGNATURE_MARKER: &str = ";sig=";
/// A trailing field is a signature only if it is exactly this many hex digits.
pub const SIGNATURE_HEX_LEN: usize = 2 * SIGNATURE_LEN;

pub const VISIBILITY_PUBLIC: &str = "PUBLIC";
pub const VISIBILITY_PRIVATE_PREFIX: &str = "PRIVATE:";

/// sender, visibility and text.
pub const MIN_FIELDS: usize = 3;
