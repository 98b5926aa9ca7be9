//! # huddle-client
//!
//! Async surface for Huddle group channels.
//!
//! `huddle-core` keeps the cached view of a channel; this crate adds the
//! parts that need the network:
//!
//! - **Remote Fallback**: [`RemoteChannel`] trait for history, pins, posts,
//!   deletes, typing and leave, with a [`MockRemote`] for tests
//! - **Read Policy**: cache-first reads that only download when allowed
//! - **Lazy History**: [`MessagePages`] stream, cache batch first, then one
//!   remote request per poll
//! - **Typing**: [`TypingGuard`] keeps the indicator alive while held
//!
//! ## Example
//!
//! ```ignore
//! use huddle_client::{ClientConfig, GroupChannelHandle};
//!
//! let config = ClientConfig::from_file(Path::new("huddle.toml"))?;
//! let handle = GroupChannelHandle::create(state, &snapshot, remote, config);
//!
//! // Route gateway events through the cached channel
//! handle.channel().dispatch(event);
//!
//! // Read history, newest first
//! let mut pages = handle.messages(50);
//! while let Some(batch) = pages.try_next().await? {
//!     render(&batch);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod handle;
pub mod pager;
pub mod remote;
pub mod typing;
pub mod view;

pub use config::{
    CacheConfig, ClientConfig, ConfigError, HistoryConfig, TypingConfig, MAX_MESSAGE_CACHE_SIZE,
};
pub use handle::{ClientError, GroupChannelHandle};
pub use pager::{paged_messages, MessagePages};
pub use remote::{FileUpload, MockRemote, NewMessage, RemoteChannel, RemoteError};
pub use typing::TypingGuard;
pub use view::{MessageChannel, PrivateChannel};
