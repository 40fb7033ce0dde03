use std::collections::BTreeSet;

use thiserror::Error;

pub const MIN_GUID_LEN: usize = 16;

/// Semantic validation failure of a decoded entity.
///
/// # Examples
/// ```
/// use fedwire_core::entities::ValidationError;
///
/// let err = ValidationError::TooShort { field: "guid", min: 16 };
/// assert_eq!(err.to_string(), "guid must be at least 16 characters");
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty since it is required")]
    Required { field: &'static str },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("{field} is not a valid handle")]
    InvalidHandle { field: &'static str },
    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str },
    #[error("photo {index} is invalid: {source}")]
    InvalidPhoto {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

/// `local@domain.tld` shaped, no whitespace, single `@`.
pub fn is_valid_handle(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

pub(crate) fn require_guid(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    if value.chars().count() < MIN_GUID_LEN {
        return Err(ValidationError::TooShort {
            field,
            min: MIN_GUID_LEN,
        });
    }
    Ok(())
}

pub(crate) fn require_handle(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    if !is_valid_handle(value) {
        return Err(ValidationError::InvalidHandle { field });
    }
    Ok(())
}

pub(crate) fn optional_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && !is_valid_handle(value) {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(())
}

/// Unique lowercased `#tags` in `text`, without the leading `#`.
pub fn tags_in(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .filter(|word| word.starts_with('#') && word.chars().count() > 1)
        .map(|word| word.trim_matches('#').to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
