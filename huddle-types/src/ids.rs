//! Identity types for Huddle.
//!
//! Every entity is keyed by a 64-bit snowflake. The upper 42 bits carry the
//! creation time in milliseconds since [`SNOWFLAKE_EPOCH_MS`], so ordering
//! two ids of the same kind orders them by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix time (ms) that snowflake timestamps are relative to.
pub const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the raw snowflake value.
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Creation time encoded in the snowflake, as unix millis.
            pub fn created_at_ms(&self) -> u64 {
                (self.0 >> 22) + SNOWFLAKE_EPOCH_MS
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

snowflake_id! {
    /// Identifies a channel (group, voice, text, ...).
    ChannelId
}

snowflake_id! {
    /// Identifies a user account.
    UserId
}

snowflake_id! {
    /// Identifies a message. Later messages have larger ids.
    MessageId
}
