//! Read policy and history paging parameters.

use serde::{Deserialize, Serialize};

use crate::MessageId;

/// Largest page the remote history endpoint returns per request.
pub const MAX_MESSAGES_PER_BATCH: usize = 100;

/// Whether a cache miss may fall through to a remote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Serve from cache only. A miss is reported as absent.
    CacheOnly,
    /// Fetch remotely on a miss.
    #[default]
    AllowDownload,
}

/// Direction of a history read relative to its starting message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Older messages, newest first.
    #[default]
    Before,
    /// Newer messages, oldest first.
    After,
    /// Messages on both sides of the start.
    Around,
}

/// One remote history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    /// Starting message (exclusive). `None` means "latest".
    pub from: Option<MessageId>,
    /// Direction to read in.
    pub direction: Direction,
    /// Maximum number of messages to return.
    pub limit: usize,
}

impl MessageQuery {
    /// Latest `limit` messages.
    pub fn latest(limit: usize) -> Self {
        Self {
            from: None,
            direction: Direction::Before,
            limit,
        }
    }

    /// `limit` messages in `direction` from `from`.
    pub fn starting_at(from: MessageId, direction: Direction, limit: usize) -> Self {
        Self {
            from: Some(from),
            direction,
            limit,
        }
    }
}
