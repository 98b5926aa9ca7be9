//! Voice presence for a group channel.

use dashmap::DashMap;
use huddle_types::{ChannelId, UserId, VoiceStateModel};
use std::sync::Arc;

use crate::index::StateIndex;

/// A user's voice presence.
///
/// `channel_id` is the voice-capable channel the user joined, resolved
/// through the global index when the state was recorded. It is `None` when
/// that channel was not known yet; the entry is kept either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceState {
    /// User whose presence this is.
    pub user_id: UserId,
    /// Resolved voice channel, if the index knew it.
    pub channel_id: Option<ChannelId>,
    /// Voice session identifier.
    pub session_id: String,
    /// Server-side deafen.
    pub deaf: bool,
    /// Server-side mute.
    pub mute: bool,
    /// Self deafen.
    pub self_deaf: bool,
    /// Self mute.
    pub self_mute: bool,
    /// Suppressed.
    pub suppress: bool,
}

impl VoiceState {
    fn from_model(model: &VoiceStateModel, channel_id: Option<ChannelId>) -> Self {
        Self {
            user_id: model.user_id,
            channel_id,
            session_id: model.session_id.clone(),
            deaf: model.deaf,
            mute: model.mute,
            self_deaf: model.self_deaf,
            self_mute: model.self_mute,
            suppress: model.suppress,
        }
    }

    /// Muted by anyone.
    pub fn is_muted(&self) -> bool {
        self.mute || self.self_mute
    }

    /// Deafened by anyone.
    pub fn is_deafened(&self) -> bool {
        self.deaf || self.self_deaf
    }
}

/// Concurrent user → voice state table.
pub struct VoiceStateTable {
    states: DashMap<UserId, Arc<VoiceState>>,
    index: Arc<dyn StateIndex>,
}

impl std::fmt::Debug for VoiceStateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceStateTable")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl VoiceStateTable {
    /// Create an empty table.
    pub fn new(index: Arc<dyn StateIndex>) -> Self {
        Self {
            states: DashMap::with_capacity(5),
            index,
        }
    }

    /// Insert or overwrite the state for `model.user_id`.
    pub fn upsert(&self, model: &VoiceStateModel) -> Arc<VoiceState> {
        let channel_id = model.channel_id.filter(|id| {
            self.index
                .resolve_channel(*id)
                .is_some_and(|kind| kind.is_voice_capable())
        });
        if let (Some(requested), None) = (model.channel_id, channel_id) {
            tracing::debug!(
                user_id = %model.user_id,
                channel_id = %requested,
                "voice channel not resolvable; keeping state without channel"
            );
        }

        let state = Arc::new(VoiceState::from_model(model, channel_id));
        self.states.insert(model.user_id, Arc::clone(&state));
        state
    }

    /// Look up a user's voice state.
    pub fn get(&self, id: UserId) -> Option<Arc<VoiceState>> {
        self.states.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a user's voice state.
    pub fn remove(&self, id: UserId) -> Option<Arc<VoiceState>> {
        self.states.remove(&id).map(|(_, state)| state)
    }

    /// All voice states, ordered by user id.
    pub fn voice_states(&self) -> Vec<Arc<VoiceState>> {
        let mut states: Vec<Arc<VoiceState>> = self
            .states
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        states.sort_unstable_by_key(|state| state.user_id);
        states
    }

    /// Drop every voice state.
    pub fn clear(&self) {
        self.states.clear();
    }

    /// Number of users in voice.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if nobody is in voice.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ClientState;
    use huddle_types::ChannelKind;

    fn table() -> (Arc<ClientState>, VoiceStateTable) {
        let state = Arc::new(ClientState::new());
        let table = VoiceStateTable::new(state.clone());
        (state, table)
    }

    #[test]
    fn upsert_resolves_known_voice_channel() {
        let (state, table) = table();
        state.insert_channel(ChannelId::new(50), ChannelKind::Group);

        let voice = table.upsert(&VoiceStateModel::new(1, Some(ChannelId::new(50))));
        assert_eq!(voice.channel_id, Some(ChannelId::new(50)));
        assert_eq!(table.get(UserId::new(1)).unwrap().channel_id, Some(ChannelId::new(50)));
    }

    #[test]
    fn upsert_keeps_unresolvable_channel_as_none() {
        let (_state, table) = table();

        table.upsert(&VoiceStateModel::new(1, Some(ChannelId::new(404))));
        let voice = table.get(UserId::new(1)).unwrap();
        assert_eq!(voice.user_id, UserId::new(1));
        assert!(voice.channel_id.is_none());
    }

    #[test]
    fn non_voice_channel_does_not_resolve() {
        let (state, table) = table();
        state.insert_channel(ChannelId::new(60), ChannelKind::Text);

        let voice = table.upsert(&VoiceStateModel::new(1, Some(ChannelId::new(60))));
        assert!(voice.channel_id.is_none());
    }

    #[test]
    fn upsert_overwrites() {
        let (state, table) = table();
        state.insert_channel(ChannelId::new(50), ChannelKind::Voice);

        table.upsert(&VoiceStateModel::new(1, Some(ChannelId::new(50))));
        let mut muted = VoiceStateModel::new(1, Some(ChannelId::new(50)));
        muted.self_mute = true;
        table.upsert(&muted);

        assert_eq!(table.len(), 1);
        assert!(table.get(UserId::new(1)).unwrap().is_muted());
    }

    #[test]
    fn remove_returns_state() {
        let (_state, table) = table();
        table.upsert(&VoiceStateModel::new(1, None));

        assert!(table.remove(UserId::new(1)).is_some());
        assert!(table.remove(UserId::new(1)).is_none());
        assert!(table.get(UserId::new(1)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn clear_empties_table() {
        let (_state, table) = table();
        table.upsert(&VoiceStateModel::new(1, None));
        table.upsert(&VoiceStateModel::new(2, None));

        table.clear();
        assert!(table.is_empty());
        assert!(table.get(UserId::new(2)).is_none());
    }
}
