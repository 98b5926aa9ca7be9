//! Decoded gateway payloads.
//!
//! These are the shapes the decoding layer hands to the cache. They are
//! assumed valid; nothing here checks invariants beyond what serde enforces.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ChannelId, Field, MessageId, TypesError, UserId};

/// Decode a payload from JSON text.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, TypesError> {
    serde_json::from_str(text).map_err(TypesError::Decode)
}

/// Kind of a channel as known to the global index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Guild text channel.
    Text,
    /// One-to-one private channel.
    Direct,
    /// Guild voice channel.
    Voice,
    /// Multi-member private channel.
    Group,
    /// Guild category.
    Category,
}

impl ChannelKind {
    /// Whether users can hold a voice session in this kind of channel.
    pub fn is_voice_capable(&self) -> bool {
        matches!(self, Self::Voice | Self::Group)
    }
}

/// A user as it appears in recipient lists and message authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    /// User identity.
    pub id: UserId,
    /// Account name.
    pub username: String,
    /// Legacy four-digit tag.
    #[serde(default)]
    pub discriminator: Option<String>,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Automated account.
    #[serde(default)]
    pub bot: bool,
}

impl UserModel {
    /// Minimal user with just an id and a name.
    pub fn new(id: impl Into<UserId>, username: &str) -> Self {
        Self {
            id: id.into(),
            username: username.to_string(),
            discriminator: None,
            avatar: None,
            bot: false,
        }
    }
}

/// A (possibly partial) group channel payload.
///
/// Snapshot payloads carry every field. Incremental updates carry only the
/// fields that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelModel {
    /// Channel identity. Always present.
    pub id: ChannelId,
    /// Display name. `Present(None)` clears it.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<Option<String>>,
    /// Icon hash. `Present(None)` clears it.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub icon: Field<Option<String>>,
    /// Complete member list. When present it replaces the member table.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub recipients: Field<Vec<UserModel>>,
}

impl ChannelModel {
    /// Payload with every field absent.
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            name: Field::Absent,
            icon: Field::Absent,
            recipients: Field::Absent,
        }
    }

    /// Mark the name present.
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = Field::Present(name.map(str::to_string));
        self
    }

    /// Mark the icon present.
    pub fn with_icon(mut self, icon: Option<&str>) -> Self {
        self.icon = Field::Present(icon.map(str::to_string));
        self
    }

    /// Mark the recipient list present.
    pub fn with_recipients(mut self, recipients: Vec<UserModel>) -> Self {
        self.recipients = Field::Present(recipients);
        self
    }
}

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageModel {
    /// Message identity.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Author.
    pub author: UserModel,
    /// Text content. Opaque to the cache.
    #[serde(default)]
    pub content: String,
    /// Creation time, unix millis.
    pub timestamp: u64,
    /// Text-to-speech flag.
    #[serde(default)]
    pub tts: bool,
    /// Pinned flag.
    #[serde(default)]
    pub pinned: bool,
}

/// A voice presence update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateModel {
    /// The user whose presence changed.
    pub user_id: UserId,
    /// The voice channel joined. `None` means the user left voice.
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    /// Voice session identifier.
    #[serde(default)]
    pub session_id: String,
    /// Server-side deafen.
    #[serde(default)]
    pub deaf: bool,
    /// Server-side mute.
    #[serde(default)]
    pub mute: bool,
    /// Self deafen.
    #[serde(default)]
    pub self_deaf: bool,
    /// Self mute.
    #[serde(default)]
    pub self_mute: bool,
    /// Suppressed (cannot speak).
    #[serde(default)]
    pub suppress: bool,
}

impl VoiceStateModel {
    /// Voice state with every flag cleared.
    pub fn new(user_id: impl Into<UserId>, channel_id: Option<ChannelId>) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id,
            session_id: String::new(),
            deaf: false,
            mute: false,
            self_deaf: false,
            self_mute: false,
            suppress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_channel_update_decodes() {
        let model: ChannelModel = from_json(r#"{"id": 10, "name": "Trip Planning"}"#).unwrap();
        assert_eq!(model.id, ChannelId::new(10));
        assert_eq!(model.name, Field::Present(Some("Trip Planning".to_string())));
        assert!(model.icon.is_absent());
        assert!(model.recipients.is_absent());
    }

    #[test]
    fn snapshot_decodes_recipients() {
        let model: ChannelModel = from_json(
            r#"{"id": 10, "name": null, "icon": "abc", "recipients": [
                {"id": 1, "username": "ana"},
                {"id": 2, "username": "bo", "bot": true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(model.name, Field::Present(None));
        assert_eq!(model.icon, Field::Present(Some("abc".to_string())));
        let recipients = model.recipients.into_option().unwrap();
        assert_eq!(recipients.len(), 2);
        assert!(recipients[1].bot);
    }

    #[test]
    fn voice_state_without_channel_decodes() {
        let model: VoiceStateModel = from_json(r#"{"user_id": 4, "channel_id": null}"#).unwrap();
        assert_eq!(model.user_id, UserId::new(4));
        assert!(model.channel_id.is_none());
    }

    #[test]
    fn bad_json_is_a_decode_error() {
        let err = from_json::<ChannelModel>("{").unwrap_err();
        assert!(matches!(err, TypesError::Decode(_)));
    }

    #[test]
    fn voice_capable_kinds() {
        assert!(ChannelKind::Voice.is_voice_capable());
        assert!(ChannelKind::Group.is_voice_capable());
        assert!(!ChannelKind::Text.is_voice_capable());
    }
}
