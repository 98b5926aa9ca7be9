//! Error types for Huddle payload handling.

use thiserror::Error;

/// Errors raised while turning raw payloads into models.
#[derive(Debug, Error)]
pub enum TypesError {
    /// JSON decoding failed
    #[error("payload decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}
