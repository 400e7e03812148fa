//! Immutable session tokens and their redacted secrets.

pub mod record;
pub mod secret;
