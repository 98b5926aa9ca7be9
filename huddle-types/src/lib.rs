//! # huddle-types
//!
//! Payload and identity types for Huddle group channels.
//!
//! This crate provides the foundational types used across all Huddle crates:
//! - [`ChannelId`], [`UserId`], [`MessageId`] - Snowflake identities
//! - [`Field`] - Absent/present wrapper for partial updates
//! - [`ChannelModel`], [`UserModel`], [`MessageModel`], [`VoiceStateModel`] - Decoded payloads
//! - [`ChannelEvent`] - Events routed to a single channel
//! - [`ReadPolicy`], [`Direction`], [`MessageQuery`] - History read parameters
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod field;
mod ids;
mod models;
mod query;

pub use error::TypesError;
pub use events::ChannelEvent;
pub use field::Field;
pub use ids::{ChannelId, MessageId, UserId, SNOWFLAKE_EPOCH_MS};
pub use models::{from_json, ChannelKind, ChannelModel, MessageModel, UserModel, VoiceStateModel};
pub use query::{Direction, MessageQuery, ReadPolicy, MAX_MESSAGES_PER_BATCH};
