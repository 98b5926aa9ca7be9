//! Event application for group channels.
//!
//! The session's event loop routes each decoded [`ChannelEvent`] to its
//! channel and calls [`GroupChannel::dispatch`]. Dispatch mutates the caches
//! and returns a [`DispatchOutcome`] describing what changed; surfacing that
//! to the application (callbacks, channels, ...) is the caller's job.

use huddle_types::{ChannelEvent, MessageId, UserId};
use std::sync::Arc;

use crate::cache::Message;
use crate::channel::{ChannelInfo, GroupChannel};
use crate::member::GroupMember;
use crate::voice::VoiceState;

/// What a dispatched event changed.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Scalar fields (and possibly the member table) were updated.
    ChannelUpdated {
        /// Fields before the update.
        before: Arc<ChannelInfo>,
        /// Fields after the update.
        after: Arc<ChannelInfo>,
    },
    /// A member joined (or was already present).
    RecipientAdded(Arc<GroupMember>),
    /// A member left.
    RecipientRemoved {
        /// The departing user.
        user_id: UserId,
        /// The removed member, if it was in the table.
        member: Option<Arc<GroupMember>>,
    },
    /// A message arrived. Returned even when caching is disabled.
    MessageReceived(Arc<Message>),
    /// A message was deleted.
    MessageDeleted {
        /// Deleted message id.
        id: MessageId,
        /// The cached copy, if there was one.
        cached: Option<Arc<Message>>,
    },
    /// Several messages were deleted.
    MessagesDeleted(Vec<(MessageId, Option<Arc<Message>>)>),
    /// A user's voice presence changed.
    VoiceStateUpdated {
        /// User whose presence changed.
        user_id: UserId,
        /// Previous state.
        before: Option<Arc<VoiceState>>,
        /// New state. `None` when the user left voice.
        after: Option<Arc<VoiceState>>,
    },
    /// The event targeted a different channel.
    Ignored,
}

impl GroupChannel {
    /// Apply one event and report what changed.
    pub fn dispatch(&self, event: ChannelEvent) -> DispatchOutcome {
        match event {
            ChannelEvent::ChannelUpdate(model) => {
                if model.id != self.id() {
                    return self.ignored("CHANNEL_UPDATE");
                }
                let before = self.info();
                self.apply(&model);
                DispatchOutcome::ChannelUpdated {
                    before,
                    after: self.info(),
                }
            }

            ChannelEvent::RecipientAdd(user) => {
                DispatchOutcome::RecipientAdded(self.add_member(&user))
            }

            ChannelEvent::RecipientRemove(user_id) => DispatchOutcome::RecipientRemoved {
                user_id,
                member: self.remove_member(user_id),
            },

            ChannelEvent::MessageCreate(model) => {
                if model.channel_id != self.id() {
                    return self.ignored("MESSAGE_CREATE");
                }
                let message = Arc::new(Message::from(model));
                self.add_message(Arc::clone(&message));
                DispatchOutcome::MessageReceived(message)
            }

            ChannelEvent::MessageDelete(id) => DispatchOutcome::MessageDeleted {
                id,
                cached: self.remove_message(id),
            },

            ChannelEvent::MessageDeleteBulk(ids) => DispatchOutcome::MessagesDeleted(
                ids.into_iter()
                    .map(|id| (id, self.remove_message(id)))
                    .collect(),
            ),

            ChannelEvent::VoiceStateUpdate(model) => {
                let user_id = model.user_id;
                let before = self.voice_state(user_id);
                let after = if model.channel_id.is_some() {
                    Some(self.upsert_voice_state(&model))
                } else {
                    self.remove_voice_state(user_id);
                    None
                };
                DispatchOutcome::VoiceStateUpdated {
                    user_id,
                    before,
                    after,
                }
            }
        }
    }

    fn ignored(&self, kind: &str) -> DispatchOutcome {
        tracing::debug!(channel_id = %self.id(), kind, "ignoring event for another channel");
        DispatchOutcome::Ignored
    }
}
