//! Async channel handle.
//!
//! [`GroupChannelHandle`] pairs a cached [`GroupChannel`] with a
//! [`RemoteChannel`]. Reads try the cache first and fall back to the remote
//! under a [`ReadPolicy`]; writes always go to the remote. The handle never
//! adds or removes cached messages itself: sent and deleted messages come
//! back through the event stream and [`GroupChannel::dispatch`].

use huddle_core::{GroupChannel, GroupMember, Message, StateIndex};
use huddle_types::{ChannelId, ChannelModel, Direction, MessageId, MessageQuery, ReadPolicy, UserId};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::pager::{paged_messages, MessagePages};
use crate::remote::{FileUpload, NewMessage, RemoteChannel, RemoteError};
use crate::typing::TypingGuard;

/// Errors from handle operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote request failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A group channel plus the remote it falls back to.
pub struct GroupChannelHandle<R> {
    channel: Arc<GroupChannel>,
    remote: Arc<R>,
    config: ClientConfig,
}

impl<R> std::fmt::Debug for GroupChannelHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupChannelHandle")
            .field("channel", &self.channel)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R> Clone for GroupChannelHandle<R> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            remote: Arc::clone(&self.remote),
            config: self.config.clone(),
        }
    }
}

impl<R: RemoteChannel + 'static> GroupChannelHandle<R> {
    /// Wrap an existing channel.
    ///
    /// Out-of-range config values are clamped (see [`ClientConfig::clamped`])
    /// so remote requests never exceed the batch limit.
    pub fn new(channel: Arc<GroupChannel>, remote: Arc<R>, config: ClientConfig) -> Self {
        Self {
            channel,
            remote,
            config: Self::checked(config),
        }
    }

    /// Create the channel from its first snapshot, sized by `config`.
    pub fn create(
        index: Arc<dyn StateIndex>,
        model: &ChannelModel,
        remote: Arc<R>,
        config: ClientConfig,
    ) -> Self {
        let config = Self::checked(config);
        let channel = GroupChannel::create(index, model, config.cache.message_cache_size);
        Self {
            channel: Arc::new(channel),
            remote,
            config,
        }
    }

    fn checked(config: ClientConfig) -> ClientConfig {
        if let Err(error) = config.validate() {
            tracing::warn!(%error, "clamping out-of-range client config");
            return config.clamped();
        }
        config
    }

    /// The cached channel.
    pub fn channel(&self) -> &Arc<GroupChannel> {
        &self.channel
    }

    /// The remote fallback.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Channel identity.
    pub fn id(&self) -> ChannelId {
        self.channel.id()
    }

    /// Display name, if set.
    pub fn name(&self) -> Option<String> {
        self.channel.name()
    }

    /// Look up a member.
    pub fn member(&self, id: UserId) -> Option<Arc<GroupMember>> {
        self.channel.member(id)
    }

    /// Members other than the logged-in user.
    pub fn recipients(&self) -> Vec<Arc<GroupMember>> {
        self.channel.recipients()
    }

    // Reads

    /// Look up a cached message.
    pub fn cached_message(&self, id: MessageId) -> Option<Arc<Message>> {
        self.channel.cached_message(id)
    }

    /// Look up a message, downloading it on a cache miss.
    pub async fn get_message(&self, id: MessageId) -> Result<Option<Arc<Message>>, ClientError> {
        self.get_message_with(id, ReadPolicy::AllowDownload).await
    }

    /// Look up a message under `policy`.
    ///
    /// A cache hit never touches the remote. A downloaded message is
    /// returned but not added to the cache.
    pub async fn get_message_with(
        &self,
        id: MessageId,
        policy: ReadPolicy,
    ) -> Result<Option<Arc<Message>>, ClientError> {
        if let Some(message) = self.channel.cached_message(id) {
            return Ok(Some(message));
        }
        match policy {
            ReadPolicy::CacheOnly => Ok(None),
            ReadPolicy::AllowDownload => {
                let fetched = self.remote.fetch_message(self.id(), id).await?;
                Ok(fetched.map(|model| Arc::new(Message::from(model))))
            }
        }
    }

    /// The latest `limit` messages, newest first.
    pub fn messages(&self, limit: usize) -> MessagePages {
        self.messages_with(MessageQuery::latest(limit), ReadPolicy::AllowDownload)
    }

    /// `limit` messages in `direction` from `from`.
    pub fn messages_from(&self, from: MessageId, direction: Direction, limit: usize) -> MessagePages {
        self.messages_with(
            MessageQuery::starting_at(from, direction, limit),
            ReadPolicy::AllowDownload,
        )
    }

    /// History read under `policy`.
    pub fn messages_with(&self, query: MessageQuery, policy: ReadPolicy) -> MessagePages {
        paged_messages(
            &self.channel,
            Arc::clone(&self.remote),
            query,
            policy,
            self.config.history.max_messages_per_batch,
        )
    }

    /// Pinned messages. Always fetched remotely.
    pub async fn pinned_messages(&self) -> Result<Vec<Arc<Message>>, ClientError> {
        let models = self.remote.fetch_pinned_messages(self.id()).await?;
        Ok(models
            .into_iter()
            .map(|model| Arc::new(Message::from(model)))
            .collect())
    }

    // Writes

    /// Post a text message.
    pub async fn send_message(&self, content: &str, tts: bool) -> Result<Arc<Message>, ClientError> {
        let message = NewMessage::text(content).with_tts(tts);
        let posted = self.remote.send_message(self.id(), message).await?;
        Ok(Arc::new(Message::from(posted)))
    }

    /// Post a file.
    pub async fn send_file(&self, upload: FileUpload) -> Result<Arc<Message>, ClientError> {
        let posted = self.remote.send_file(self.id(), upload).await?;
        Ok(Arc::new(Message::from(posted)))
    }

    /// Read `path` and post it with `content`.
    pub async fn send_file_from_path(
        &self,
        path: impl AsRef<Path>,
        content: &str,
        tts: bool,
    ) -> Result<Arc<Message>, ClientError> {
        let upload = FileUpload::from_path(path).await?.with_content(content, tts);
        self.send_file(upload).await
    }

    /// Delete messages, in batches the remote accepts.
    ///
    /// Stops at the first failed batch; earlier batches stay deleted.
    pub async fn delete_messages(&self, ids: &[MessageId]) -> Result<(), ClientError> {
        for batch in ids.chunks(self.config.history.max_messages_per_batch.max(1)) {
            self.remote.delete_messages(self.id(), batch).await?;
        }
        Ok(())
    }

    /// Show the typing indicator once.
    pub async fn trigger_typing(&self) -> Result<(), ClientError> {
        self.remote.trigger_typing(self.id()).await?;
        Ok(())
    }

    /// Keep the typing indicator visible until the guard is dropped.
    pub fn enter_typing(&self) -> TypingGuard {
        TypingGuard::start(
            Arc::clone(&self.remote),
            self.id(),
            self.config.typing_interval(),
        )
    }

    /// Leave the channel and release its cached state.
    pub async fn leave(&self) -> Result<(), ClientError> {
        self.remote.leave_channel(self.id()).await?;
        self.channel.teardown();
        tracing::info!(channel_id = %self.id(), "left group channel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemote;
    use futures_util::TryStreamExt;
    use huddle_core::ClientState;
    use huddle_types::{ChannelEvent, MessageModel, UserModel};

    fn model(id: u64) -> MessageModel {
        MessageModel {
            id: MessageId::new(id),
            channel_id: ChannelId::new(100),
            author: UserModel::new(2, "ana"),
            content: format!("message {id}"),
            timestamp: 0,
            tts: false,
            pinned: false,
        }
    }

    fn handle(cache_size: usize) -> (MockRemote, GroupChannelHandle<MockRemote>) {
        let state = Arc::new(ClientState::with_current_user(UserId::new(1)));
        let remote = MockRemote::new();
        let snapshot = ChannelModel::new(100)
            .with_name(Some("Road Trip"))
            .with_recipients(vec![UserModel::new(1, "me"), UserModel::new(2, "ana")]);
        let config = ClientConfig::default().with_message_cache_size(cache_size);
        let handle = GroupChannelHandle::create(state, &snapshot, Arc::new(remote.clone()), config);
        (remote, handle)
    }

    fn ids(batch: &[Arc<Message>]) -> Vec<u64> {
        batch.iter().map(|message| message.id.get()).collect()
    }

    // ===== Single Message Tests =====

    #[tokio::test]
    async fn cache_hit_skips_remote() {
        let (remote, handle) = handle(10);
        handle.channel().dispatch(ChannelEvent::MessageCreate(model(5)));

        let message = handle.get_message(MessageId::new(5)).await.unwrap();
        assert_eq!(message.unwrap().content, "message 5");
        assert!(remote.message_requests().is_empty());
    }

    #[tokio::test]
    async fn cache_miss_downloads_without_caching() {
        let (remote, handle) = handle(10);
        remote.insert_message(model(5));

        let message = handle.get_message(MessageId::new(5)).await.unwrap();
        assert!(message.is_some());
        assert_eq!(remote.message_requests(), vec![MessageId::new(5)]);
        assert!(handle.cached_message(MessageId::new(5)).is_none());
    }

    #[tokio::test]
    async fn cache_only_miss_is_none() {
        let (remote, handle) = handle(10);
        remote.insert_message(model(5));

        let message = handle
            .get_message_with(MessageId::new(5), ReadPolicy::CacheOnly)
            .await
            .unwrap();
        assert!(message.is_none());
        assert!(remote.message_requests().is_empty());
    }

    #[tokio::test]
    async fn remote_error_is_propagated() {
        let (remote, handle) = handle(0);
        remote.fail_next(RemoteError::Forbidden);

        let result = handle.get_message(MessageId::new(5)).await;
        assert!(matches!(result, Err(ClientError::Remote(RemoteError::Forbidden))));
    }

    // ===== History Tests =====

    #[tokio::test]
    async fn history_from_cache_then_remote() {
        let (remote, handle) = handle(10);
        remote.insert_messages((1..=10).map(model));
        for id in 8..=10 {
            handle.channel().dispatch(ChannelEvent::MessageCreate(model(id)));
        }

        let batches: Vec<Vec<Arc<Message>>> = handle.messages(5).try_collect().await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(ids(&batches[0]), vec![10, 9, 8]);
        assert_eq!(ids(&batches[1]), vec![7, 6]);
        assert_eq!(
            remote.history_requests(),
            vec![MessageQuery::starting_at(MessageId::new(8), Direction::Before, 2)]
        );
    }

    #[tokio::test]
    async fn oversized_batch_is_clamped() {
        let state = Arc::new(ClientState::new());
        let remote = MockRemote::new();
        remote.insert_messages((1..=300).map(model));
        let handle = GroupChannelHandle::create(
            state,
            &ChannelModel::new(100),
            Arc::new(remote.clone()),
            ClientConfig::default().with_batch_size(500),
        );

        let batches: Vec<Vec<Arc<Message>>> = handle.messages(250).try_collect().await.unwrap();
        assert_eq!(batches.len(), 3);
        let limits: Vec<usize> = remote.history_requests().iter().map(|q| q.limit).collect();
        assert_eq!(limits, vec![100, 100, 50]);
        assert_eq!(
            handle.config().history.max_messages_per_batch,
            huddle_types::MAX_MESSAGES_PER_BATCH
        );
    }

    #[test]
    fn oversized_cache_does_not_panic() {
        let state = Arc::new(ClientState::new());
        let config: ClientConfig = ClientConfig::default().with_message_cache_size(usize::MAX);
        let handle = GroupChannelHandle::create(
            state,
            &ChannelModel::new(100),
            Arc::new(MockRemote::new()),
            config,
        );

        assert_eq!(
            handle.config().cache.message_cache_size,
            crate::config::MAX_MESSAGE_CACHE_SIZE
        );
        assert_eq!(
            handle.channel().message_cache().capacity(),
            crate::config::MAX_MESSAGE_CACHE_SIZE
        );
    }

    #[tokio::test]
    async fn history_is_lazy() {
        let (remote, handle) = handle(0);
        remote.insert_messages((1..=10).map(model));

        let pages = handle.messages(5);
        assert!(remote.history_requests().is_empty());
        drop(pages);
        assert!(remote.history_requests().is_empty());
    }

    #[tokio::test]
    async fn history_error_ends_stream() {
        let (remote, handle) = handle(0);
        remote.fail_next(RemoteError::Timeout);

        let batches: Vec<_> = futures_util::StreamExt::collect(handle.messages(5)).await;
        assert_eq!(batches.len(), 1);
        assert!(matches!(batches[0], Err(ClientError::Remote(RemoteError::Timeout))));
    }

    // ===== Write Tests =====

    #[tokio::test]
    async fn send_message_does_not_touch_cache() {
        let (remote, handle) = handle(10);
        let sent = handle.send_message("hello", true).await.unwrap();

        assert_eq!(sent.content, "hello");
        assert!(sent.tts);
        assert_eq!(remote.sent_messages().len(), 1);
        assert!(handle.cached_message(sent.id).is_none());
    }

    #[tokio::test]
    async fn delete_is_batched() {
        let (remote, handle) = handle(0);
        let ids: Vec<MessageId> = (1..=250).map(MessageId::new).collect();
        handle.delete_messages(&ids).await.unwrap();

        let batches = remote.deleted_batches();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn delete_stops_at_first_failed_batch() {
        let (remote, handle) = handle(0);
        remote.fail_after(1, RemoteError::RateLimited { retry_after_ms: 1000 });
        let ids: Vec<MessageId> = (1..=250).map(MessageId::new).collect();

        let result = handle.delete_messages(&ids).await;
        assert!(matches!(
            result,
            Err(ClientError::Remote(RemoteError::RateLimited { retry_after_ms: 1000 }))
        ));

        let batches = remote.deleted_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], ids[..100].to_vec());
    }

    #[tokio::test]
    async fn delete_nothing_makes_no_request() {
        let (remote, handle) = handle(0);
        handle.delete_messages(&[]).await.unwrap();
        assert!(remote.deleted_batches().is_empty());
    }

    #[tokio::test]
    async fn leave_tears_down() {
        let (remote, handle) = handle(0);
        assert_eq!(handle.channel().member_count(), 2);

        handle.leave().await.unwrap();
        assert_eq!(remote.left_channels(), vec![ChannelId::new(100)]);
        assert_eq!(handle.channel().member_count(), 0);
    }

    #[tokio::test]
    async fn failed_leave_keeps_state() {
        let (remote, handle) = handle(0);
        remote.fail_next(RemoteError::NotFound);

        assert!(handle.leave().await.is_err());
        assert_eq!(handle.channel().member_count(), 2);
    }
}
