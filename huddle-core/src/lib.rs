//! # huddle-core
//!
//! Cache and synchronization logic for Huddle group channels (no I/O,
//! instant tests).
//!
//! This crate keeps the client-side view of a group channel consistent with
//! the events and snapshots the gateway delivers:
//! - [`MemberTable`] - members, with atomic snapshot replace
//! - [`MessageCache`] - bounded FIFO cache of recent messages
//! - [`VoiceStateTable`] - voice presence
//! - [`GroupChannel`] - owns the three, applies partial updates
//! - [`PagePlan`] / [`RemotePager`] - how history reads split between cache and remote
//!
//! ## Design Philosophy
//!
//! Mutations come from one ordered event path per channel; reads may come
//! from any thread at any time. Every table is safe for concurrent readers
//! during single-writer mutation, and snapshot replacement is built off to
//! the side and published with one atomic swap.
//!
//! The actual I/O (gateway connection, history fetches) is performed by
//! `huddle-client`, which consults the plans produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod channel;
pub mod dispatch;
pub mod index;
pub mod member;
pub mod page;
pub mod voice;

pub use cache::{Message, MessageAuthor, MessageCache};
pub use channel::{ChannelInfo, GroupChannel, Lifecycle};
pub use dispatch::DispatchOutcome;
pub use index::{ClientState, GlobalUser, StateIndex};
pub use member::{GroupMember, MemberSnapshot, MemberTable};
pub use page::{PagePlan, RemotePager};
pub use voice::{VoiceState, VoiceStateTable};
