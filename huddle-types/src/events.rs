//! Gateway events already routed to a single group channel.

use serde::{Deserialize, Serialize};

use crate::{ChannelModel, MessageId, MessageModel, UserId, UserModel, VoiceStateModel};

/// An event targeting one group channel.
///
/// The session-level router decodes the raw gateway frame, looks up the
/// channel, and hands the channel one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "d", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelEvent {
    /// Partial or full channel update.
    ChannelUpdate(ChannelModel),
    /// A user joined the group.
    RecipientAdd(UserModel),
    /// A user left the group.
    RecipientRemove(UserId),
    /// A message was posted.
    MessageCreate(MessageModel),
    /// A message was deleted.
    MessageDelete(MessageId),
    /// Several messages were deleted at once.
    MessageDeleteBulk(Vec<MessageId>),
    /// A user's voice presence changed.
    VoiceStateUpdate(VoiceStateModel),
}
