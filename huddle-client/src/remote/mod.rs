//! Remote fallback for group channel reads and writes.
//!
//! The channel handle never talks to the network itself. Everything the
//! caches cannot answer, and every mutation, goes through a
//! [`RemoteChannel`] implementation (an HTTP client in production, the
//! [`MockRemote`] in tests).
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! let page = remote.fetch_messages(channel_id, MessageQuery::latest(50)).await?;
//! let sent = remote.send_message(channel_id, NewMessage::text("hi")).await?;
//! ```

mod mock;

pub use mock::MockRemote;

use async_trait::async_trait;
use huddle_types::{ChannelId, MessageId, MessageModel, MessageQuery};
use std::path::Path;
use thiserror::Error;

/// Remote request errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The channel or message does not exist.
    #[error("not found")]
    NotFound,

    /// The current user lacks permission.
    #[error("forbidden")]
    Forbidden,

    /// Too many requests.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Delay the server asked for.
        retry_after_ms: u64,
    },

    /// Any other non-success response.
    #[error("http {status}: {message}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The request timed out.
    #[error("request timeout")]
    Timeout,
}

/// Text message to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Message text.
    pub content: String,
    /// Read aloud to recipients.
    pub tts: bool,
}

impl NewMessage {
    /// Plain text message.
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tts: false,
        }
    }

    /// Set the text-to-speech flag.
    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }
}

/// File attachment to post, with optional text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Name shown to recipients.
    pub filename: String,
    /// File contents.
    pub data: Vec<u8>,
    /// Accompanying text.
    pub content: String,
    /// Read the text aloud to recipients.
    pub tts: bool,
}

impl FileUpload {
    /// Upload from bytes already in memory.
    pub fn new(filename: &str, data: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            data,
            content: String::new(),
            tts: false,
        }
    }

    /// Read an upload from disk. The file name becomes the upload name.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(&filename, data))
    }

    /// Attach text to the upload.
    pub fn with_content(mut self, content: &str, tts: bool) -> Self {
        self.content = content.to_string();
        self.tts = tts;
        self
    }
}

/// Network operations for one or more channels.
///
/// Every method takes the target channel id so one implementation can
/// serve every channel of a session.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Fetch one message. `Ok(None)` when the server has no such message.
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        id: MessageId,
    ) -> Result<Option<MessageModel>, RemoteError>;

    /// Fetch one page of history.
    ///
    /// At most `query.limit` messages are returned, which callers keep at
    /// or below [`huddle_types::MAX_MESSAGES_PER_BATCH`].
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        query: MessageQuery,
    ) -> Result<Vec<MessageModel>, RemoteError>;

    /// Fetch the pinned messages.
    async fn fetch_pinned_messages(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<MessageModel>, RemoteError>;

    /// Post a text message.
    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: NewMessage,
    ) -> Result<MessageModel, RemoteError>;

    /// Post a file.
    async fn send_file(
        &self,
        channel_id: ChannelId,
        upload: FileUpload,
    ) -> Result<MessageModel, RemoteError>;

    /// Delete messages. Callers send at most one batch per call.
    async fn delete_messages(
        &self,
        channel_id: ChannelId,
        ids: &[MessageId],
    ) -> Result<(), RemoteError>;

    /// Show the typing indicator for a few seconds.
    async fn trigger_typing(&self, channel_id: ChannelId) -> Result<(), RemoteError>;

    /// Leave the channel.
    async fn leave_channel(&self, channel_id: ChannelId) -> Result<(), RemoteError>;
}
