//! Capability views over a channel handle.
//!
//! Code that only needs "somewhere messages can be read and posted" or
//! "a channel with recipients" can take these traits instead of the
//! concrete handle. Unlike the inherent methods, every read here names its
//! [`ReadPolicy`] explicitly.

use async_trait::async_trait;
use huddle_core::{GroupMember, Message};
use huddle_types::{ChannelId, MessageId, MessageQuery, ReadPolicy, UserId};
use std::sync::Arc;

use crate::handle::{ClientError, GroupChannelHandle};
use crate::pager::MessagePages;
use crate::remote::{FileUpload, RemoteChannel};
use crate::typing::TypingGuard;

/// A channel messages can be read from and posted to.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Channel identity.
    fn channel_id(&self) -> ChannelId;

    /// Look up one message.
    async fn get_message(
        &self,
        id: MessageId,
        policy: ReadPolicy,
    ) -> Result<Option<Arc<Message>>, ClientError>;

    /// Read history.
    fn get_messages(&self, query: MessageQuery, policy: ReadPolicy) -> MessagePages;

    /// Pinned messages.
    async fn get_pinned_messages(&self) -> Result<Vec<Arc<Message>>, ClientError>;

    /// Post a text message.
    async fn send_message(&self, content: &str, tts: bool) -> Result<Arc<Message>, ClientError>;

    /// Post a file.
    async fn send_file(&self, upload: FileUpload) -> Result<Arc<Message>, ClientError>;

    /// Delete messages.
    async fn delete_messages(&self, ids: &[MessageId]) -> Result<(), ClientError>;

    /// Keep the typing indicator visible until the guard is dropped.
    fn enter_typing(&self) -> TypingGuard;
}

/// A private channel with a fixed set of recipients.
pub trait PrivateChannel: Send + Sync {
    /// Channel identity.
    fn channel_id(&self) -> ChannelId;

    /// Members other than the logged-in user.
    fn recipients(&self) -> Vec<Arc<GroupMember>>;

    /// Look up a member.
    fn member(&self, id: UserId) -> Option<Arc<GroupMember>>;
}

#[async_trait]
impl<R: RemoteChannel + 'static> MessageChannel for GroupChannelHandle<R> {
    fn channel_id(&self) -> ChannelId {
        self.id()
    }

    async fn get_message(
        &self,
        id: MessageId,
        policy: ReadPolicy,
    ) -> Result<Option<Arc<Message>>, ClientError> {
        self.get_message_with(id, policy).await
    }

    fn get_messages(&self, query: MessageQuery, policy: ReadPolicy) -> MessagePages {
        self.messages_with(query, policy)
    }

    async fn get_pinned_messages(&self) -> Result<Vec<Arc<Message>>, ClientError> {
        self.pinned_messages().await
    }

    async fn send_message(&self, content: &str, tts: bool) -> Result<Arc<Message>, ClientError> {
        GroupChannelHandle::send_message(self, content, tts).await
    }

    async fn send_file(&self, upload: FileUpload) -> Result<Arc<Message>, ClientError> {
        GroupChannelHandle::send_file(self, upload).await
    }

    async fn delete_messages(&self, ids: &[MessageId]) -> Result<(), ClientError> {
        GroupChannelHandle::delete_messages(self, ids).await
    }

    fn enter_typing(&self) -> TypingGuard {
        GroupChannelHandle::enter_typing(self)
    }
}

impl<R: RemoteChannel + 'static> PrivateChannel for GroupChannelHandle<R> {
    fn channel_id(&self) -> ChannelId {
        self.id()
    }

    fn recipients(&self) -> Vec<Arc<GroupMember>> {
        GroupChannelHandle::recipients(self)
    }

    fn member(&self, id: UserId) -> Option<Arc<GroupMember>> {
        GroupChannelHandle::member(self, id)
    }
}
