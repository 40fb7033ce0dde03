//! Checks shared by every built-in protocol.

pub(crate) mod reader;
pub(crate) mod verify;

pub(crate) use reader::optional_non_empty;
pub(crate) use verify::{check_recipient, verify_author};
