//! Group channel entity.
//!
//! A [`GroupChannel`] owns the member table, message cache and voice
//! presence table for one multi-member private channel, and applies
//! partial-update payloads to its scalar fields.
//!
//! ```text
//! event dispatcher ─▶ apply / add_* / remove_* / upsert_*   (single writer)
//! callers          ─▶ name / member / cached_message / ...   (any thread)
//! ```
//!
//! Name and icon are published together as one immutable [`ChannelInfo`],
//! swapped atomically, so readers never see fields from two different
//! updates.

use arc_swap::ArcSwap;
use huddle_types::{
    ChannelId, ChannelModel, Direction, Field, MessageId, UserId, UserModel, VoiceStateModel,
};
use std::fmt;
use std::sync::Arc;

use crate::cache::{Message, MessageCache};
use crate::index::StateIndex;
use crate::member::{GroupMember, MemberSnapshot, MemberTable};
use crate::voice::{VoiceState, VoiceStateTable};

/// Whether the channel has seen its first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, no update applied yet.
    Uninitialized,
    /// At least one update applied.
    Initialized,
}

/// Scalar channel fields, published as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Display name.
    pub name: Option<String>,
    /// Icon hash.
    pub icon: Option<String>,
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
}

impl ChannelInfo {
    fn uninitialized() -> Self {
        Self {
            name: None,
            icon: None,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// Copy of `self` with every present field of `model` written over it.
    fn merged(&self, model: &ChannelModel) -> Self {
        let mut next = self.clone();
        if let Field::Present(name) = &model.name {
            next.name = name.clone();
        }
        if let Field::Present(icon) = &model.icon {
            next.icon = icon.clone();
        }
        next.lifecycle = Lifecycle::Initialized;
        next
    }
}

/// Client-side cached state of one group channel.
pub struct GroupChannel {
    id: ChannelId,
    info: ArcSwap<ChannelInfo>,
    members: MemberTable,
    messages: MessageCache,
    voice_states: VoiceStateTable,
    index: Arc<dyn StateIndex>,
}

impl GroupChannel {
    /// Create an uninitialized channel.
    ///
    /// `message_cache_size` of zero disables message caching.
    pub fn new(id: ChannelId, index: Arc<dyn StateIndex>, message_cache_size: usize) -> Self {
        Self {
            id,
            info: ArcSwap::from_pointee(ChannelInfo::uninitialized()),
            members: MemberTable::new(id, Arc::clone(&index)),
            messages: MessageCache::new(message_cache_size),
            voice_states: VoiceStateTable::new(Arc::clone(&index)),
            index,
        }
    }

    /// Create a channel from its first snapshot.
    pub fn create(
        index: Arc<dyn StateIndex>,
        model: &ChannelModel,
        message_cache_size: usize,
    ) -> Self {
        let channel = Self::new(model.id, index, message_cache_size);
        channel.apply(model);
        channel
    }

    /// Apply a (possibly partial) update.
    ///
    /// Absent fields are left untouched. Present fields overwrite, including
    /// with `None`. A present recipient list replaces the member table.
    pub fn apply(&self, model: &ChannelModel) {
        let next = self.info.load().merged(model);
        self.info.store(Arc::new(next));

        if let Field::Present(recipients) = &model.recipients {
            self.members.bulk_replace(recipients);
        }
    }

    /// Release every member reference and drop cached messages and voice
    /// states.
    ///
    /// Call when the channel is left or the session is torn down.
    pub fn teardown(&self) {
        self.members.clear();
        self.messages.clear();
        self.voice_states.clear();
        tracing::debug!(channel_id = %self.id, "channel torn down");
    }

    /// Channel identity.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Current scalar fields.
    pub fn info(&self) -> Arc<ChannelInfo> {
        self.info.load_full()
    }

    /// Display name, if set.
    pub fn name(&self) -> Option<String> {
        self.info.load().name.clone()
    }

    /// Icon hash, if set.
    pub fn icon(&self) -> Option<String> {
        self.info.load().icon.clone()
    }

    /// Lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.info.load().lifecycle
    }

    /// Whether the first update has been applied.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle() == Lifecycle::Initialized
    }

    /// The global index this channel resolves through.
    pub fn index(&self) -> &Arc<dyn StateIndex> {
        &self.index
    }

    // Members

    /// Look up a member.
    pub fn member(&self, id: UserId) -> Option<Arc<GroupMember>> {
        self.members.get(id)
    }

    /// All members, ordered by id.
    pub fn members(&self) -> Vec<Arc<GroupMember>> {
        self.members.members()
    }

    /// Consistent view of the member table.
    pub fn member_snapshot(&self) -> MemberSnapshot {
        self.members.snapshot()
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members other than the logged-in user.
    pub fn recipients(&self) -> Vec<Arc<GroupMember>> {
        let current = self.index.current_user_id();
        self.members
            .members()
            .into_iter()
            .filter(|member| Some(member.id()) != current)
            .collect()
    }

    /// Add a member, or return the existing one.
    pub fn add_member(&self, model: &UserModel) -> Arc<GroupMember> {
        self.members.add_or_get(model)
    }

    /// Remove a member.
    pub fn remove_member(&self, id: UserId) -> Option<Arc<GroupMember>> {
        self.members.remove(id)
    }

    // Messages

    /// Look up a cached message.
    pub fn cached_message(&self, id: MessageId) -> Option<Arc<Message>> {
        self.messages.get(id)
    }

    /// All cached messages, oldest first.
    pub fn cached_messages(&self) -> Vec<Arc<Message>> {
        self.messages.messages()
    }

    /// Up to `limit` cached messages relative to `from`.
    pub fn cached_messages_page(
        &self,
        from: Option<MessageId>,
        direction: Direction,
        limit: usize,
    ) -> Vec<Arc<Message>> {
        self.messages.get_many(from, direction, limit)
    }

    /// The message cache.
    pub fn message_cache(&self) -> &MessageCache {
        &self.messages
    }

    /// Cache an inbound message.
    pub fn add_message(&self, message: Arc<Message>) {
        self.messages.add(message);
    }

    /// Drop a cached message.
    pub fn remove_message(&self, id: MessageId) -> Option<Arc<Message>> {
        self.messages.remove(id)
    }

    // Voice states

    /// Look up a user's voice state.
    pub fn voice_state(&self, id: UserId) -> Option<Arc<VoiceState>> {
        self.voice_states.get(id)
    }

    /// All voice states, ordered by user id.
    pub fn voice_states(&self) -> Vec<Arc<VoiceState>> {
        self.voice_states.voice_states()
    }

    /// Insert or overwrite a voice state.
    pub fn upsert_voice_state(&self, model: &VoiceStateModel) -> Arc<VoiceState> {
        self.voice_states.upsert(model)
    }

    /// Remove a voice state.
    pub fn remove_voice_state(&self, id: UserId) -> Option<Arc<VoiceState>> {
        self.voice_states.remove(id)
    }
}

impl fmt::Display for GroupChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info.load().name.as_deref().unwrap_or_default())
    }
}

impl fmt::Debug for GroupChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, Group)", self, self.id)
    }
}
