//! Mock remote for testing.
//!
//! Serves history from an in-memory message store and records every
//! mutation for verification.

use super::{FileUpload, NewMessage, RemoteChannel, RemoteError};
use async_trait::async_trait;
use huddle_types::{ChannelId, Direction, MessageId, MessageModel, MessageQuery, UserModel};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// First id handed to messages posted through the mock.
const FIRST_SENT_ID: u64 = 1_000_000;

/// Mock remote for testing.
///
/// Clones share state, so a test can keep one clone for assertions while
/// the handle owns another.
#[derive(Debug, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    history: BTreeMap<MessageId, MessageModel>,
    author: Option<UserModel>,
    next_id: u64,
    sent: Vec<NewMessage>,
    uploads: Vec<FileUpload>,
    deleted: Vec<Vec<MessageId>>,
    typing_count: usize,
    left: Vec<ChannelId>,
    history_requests: Vec<MessageQuery>,
    message_requests: Vec<MessageId>,
    /// Successful calls still allowed before the pending failure fires.
    fail_next: Option<(usize, RemoteError)>,
}

impl MockRemoteInner {
    fn check_failure(&mut self) -> Result<(), RemoteError> {
        match self.fail_next.take() {
            Some((0, error)) => Err(error),
            Some((remaining, error)) => {
                self.fail_next = Some((remaining - 1, error));
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn channel_history(
        &self,
        channel_id: ChannelId,
    ) -> impl DoubleEndedIterator<Item = &MessageModel> + '_ {
        self.history
            .values()
            .filter(move |message| message.channel_id == channel_id)
    }

    fn post(&mut self, channel_id: ChannelId, content: &str, tts: bool) -> MessageModel {
        if self.next_id == 0 {
            self.next_id = FIRST_SENT_ID;
        }
        let id = MessageId::new(self.next_id);
        self.next_id += 1;

        let message = MessageModel {
            id,
            channel_id,
            author: self
                .author
                .clone()
                .unwrap_or_else(|| UserModel::new(1, "me")),
            content: content.to_string(),
            timestamp: id.created_at_ms(),
            tts,
            pinned: false,
        };
        self.history.insert(id, message.clone());
        message
    }
}

impl MockRemote {
    /// Create an empty mock remote.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRemoteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a message in the server-side history.
    pub fn insert_message(&self, message: MessageModel) {
        self.lock().history.insert(message.id, message);
    }

    /// Store several messages in the server-side history.
    pub fn insert_messages(&self, messages: impl IntoIterator<Item = MessageModel>) {
        let mut inner = self.lock();
        for message in messages {
            inner.history.insert(message.id, message);
        }
    }

    /// Author stamped on messages posted through the mock.
    pub fn set_author(&self, author: UserModel) {
        self.lock().author = Some(author);
    }

    /// Cause the next call, whatever it is, to fail with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.fail_after(0, error);
    }

    /// Let `successes` calls through, then fail the one after with `error`.
    pub fn fail_after(&self, successes: usize, error: RemoteError) {
        self.lock().fail_next = Some((successes, error));
    }

    /// Text messages posted so far.
    pub fn sent_messages(&self) -> Vec<NewMessage> {
        self.lock().sent.clone()
    }

    /// Files posted so far.
    pub fn uploads(&self) -> Vec<FileUpload> {
        self.lock().uploads.clone()
    }

    /// Delete requests, one entry per call.
    pub fn deleted_batches(&self) -> Vec<Vec<MessageId>> {
        self.lock().deleted.clone()
    }

    /// Number of typing indicators triggered.
    pub fn typing_count(&self) -> usize {
        self.lock().typing_count
    }

    /// Channels left so far.
    pub fn left_channels(&self) -> Vec<ChannelId> {
        self.lock().left.clone()
    }

    /// History page requests, in order.
    pub fn history_requests(&self) -> Vec<MessageQuery> {
        self.lock().history_requests.clone()
    }

    /// Single-message fetches, in order.
    pub fn message_requests(&self) -> Vec<MessageId> {
        self.lock().message_requests.clone()
    }

    /// Clear all state (history, logs, pending failure).
    pub fn reset(&self) {
        *self.lock() = MockRemoteInner::default();
    }
}

impl Clone for MockRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteChannel for MockRemote {
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        id: MessageId,
    ) -> Result<Option<MessageModel>, RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;
        inner.message_requests.push(id);

        Ok(inner
            .history
            .get(&id)
            .filter(|message| message.channel_id == channel_id)
            .cloned())
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        query: MessageQuery,
    ) -> Result<Vec<MessageModel>, RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;
        inner.history_requests.push(query);

        let limit = query.limit;
        let page: Vec<MessageModel> = match (query.direction, query.from) {
            (Direction::Before, from) => inner
                .channel_history(channel_id)
                .rev()
                .filter(|message| from.map_or(true, |from| message.id < from))
                .take(limit)
                .cloned()
                .collect(),
            (Direction::After, from) => inner
                .channel_history(channel_id)
                .filter(|message| from.map_or(true, |from| message.id > from))
                .take(limit)
                .cloned()
                .collect(),
            (Direction::Around, None) => inner
                .channel_history(channel_id)
                .rev()
                .take(limit)
                .cloned()
                .collect(),
            (Direction::Around, Some(from)) => {
                let older: Vec<MessageModel> = inner
                    .channel_history(channel_id)
                    .rev()
                    .filter(|message| message.id < from)
                    .take(limit / 2)
                    .cloned()
                    .collect();
                let newer_count = limit - older.len();
                let mut page: Vec<MessageModel> = inner
                    .channel_history(channel_id)
                    .filter(|message| message.id >= from)
                    .take(newer_count)
                    .cloned()
                    .collect();
                page.reverse();
                page.extend(older);
                page
            }
        };
        Ok(page)
    }

    async fn fetch_pinned_messages(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<MessageModel>, RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;

        Ok(inner
            .channel_history(channel_id)
            .rev()
            .filter(|message| message.pinned)
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: NewMessage,
    ) -> Result<MessageModel, RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;

        let posted = inner.post(channel_id, &message.content, message.tts);
        inner.sent.push(message);
        Ok(posted)
    }

    async fn send_file(
        &self,
        channel_id: ChannelId,
        upload: FileUpload,
    ) -> Result<MessageModel, RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;

        let posted = inner.post(channel_id, &upload.content, upload.tts);
        inner.uploads.push(upload);
        Ok(posted)
    }

    async fn delete_messages(
        &self,
        _channel_id: ChannelId,
        ids: &[MessageId],
    ) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;

        for id in ids {
            inner.history.remove(id);
        }
        inner.deleted.push(ids.to_vec());
        Ok(())
    }

    async fn trigger_typing(&self, _channel_id: ChannelId) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;
        inner.typing_count += 1;
        Ok(())
    }

    async fn leave_channel(&self, channel_id: ChannelId) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.check_failure()?;
        inner.left.push(channel_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL: ChannelId = ChannelId::new(100);

    fn message(id: u64) -> MessageModel {
        MessageModel {
            id: MessageId::new(id),
            channel_id: CHANNEL,
            author: UserModel::new(2, "ana"),
            content: format!("message {id}"),
            timestamp: 0,
            tts: false,
            pinned: false,
        }
    }

    fn seeded(ids: std::ops::RangeInclusive<u64>) -> MockRemote {
        let remote = MockRemote::new();
        remote.insert_messages(ids.map(message));
        remote
    }

    fn ids(page: &[MessageModel]) -> Vec<u64> {
        page.iter().map(|message| message.id.get()).collect()
    }

    // ===== History Tests =====

    #[tokio::test]
    async fn latest_is_newest_first() {
        let remote = seeded(1..=10);
        let page = remote
            .fetch_messages(CHANNEL, MessageQuery::latest(3))
            .await
            .unwrap();

        assert_eq!(ids(&page), vec![10, 9, 8]);
        assert_eq!(remote.history_requests(), vec![MessageQuery::latest(3)]);
    }

    #[tokio::test]
    async fn before_excludes_start() {
        let remote = seeded(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(5), Direction::Before, 10);
        let page = remote.fetch_messages(CHANNEL, query).await.unwrap();

        assert_eq!(ids(&page), vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn after_is_oldest_first() {
        let remote = seeded(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(5), Direction::After, 3);
        let page = remote.fetch_messages(CHANNEL, query).await.unwrap();

        assert_eq!(ids(&page), vec![6, 7, 8]);
    }

    #[tokio::test]
    async fn around_spans_both_sides() {
        let remote = seeded(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(5), Direction::Around, 4);
        let page = remote.fetch_messages(CHANNEL, query).await.unwrap();

        assert_eq!(ids(&page), vec![6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn other_channels_are_invisible() {
        let remote = seeded(1..=3);
        let mut elsewhere = message(4);
        elsewhere.channel_id = ChannelId::new(7);
        remote.insert_message(elsewhere);

        let page = remote
            .fetch_messages(CHANNEL, MessageQuery::latest(10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![3, 2, 1]);
        assert!(remote
            .fetch_message(CHANNEL, MessageId::new(4))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn pinned_only() {
        let remote = seeded(1..=3);
        let mut pinned = message(4);
        pinned.pinned = true;
        remote.insert_message(pinned);

        let page = remote.fetch_pinned_messages(CHANNEL).await.unwrap();
        assert_eq!(ids(&page), vec![4]);
    }

    // ===== Mutation Tests =====

    #[tokio::test]
    async fn send_assigns_ids_and_records() {
        let remote = MockRemote::new();
        remote.set_author(UserModel::new(9, "host"));

        let first = remote
            .send_message(CHANNEL, NewMessage::text("one"))
            .await
            .unwrap();
        let second = remote
            .send_message(CHANNEL, NewMessage::text("two"))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.author.username, "host");
        assert_eq!(remote.sent_messages().len(), 2);
        assert!(remote.fetch_message(CHANNEL, first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_removes_from_history() {
        let remote = seeded(1..=3);
        remote
            .delete_messages(CHANNEL, &[MessageId::new(1), MessageId::new(2)])
            .await
            .unwrap();

        assert_eq!(remote.deleted_batches().len(), 1);
        let page = remote
            .fetch_messages(CHANNEL, MessageQuery::latest(10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![3]);
    }

    // ===== Forced Failure Tests =====

    #[tokio::test]
    async fn fail_next_applies_once() {
        let remote = MockRemote::new();
        remote.fail_next(RemoteError::Forbidden);

        let result = remote.trigger_typing(CHANNEL).await;
        assert_eq!(result, Err(RemoteError::Forbidden));

        remote.trigger_typing(CHANNEL).await.unwrap();
        assert_eq!(remote.typing_count(), 1);
    }

    #[tokio::test]
    async fn fail_after_skips_earlier_calls() {
        let remote = MockRemote::new();
        remote.fail_after(2, RemoteError::Timeout);

        remote.trigger_typing(CHANNEL).await.unwrap();
        remote.leave_channel(CHANNEL).await.unwrap();
        assert_eq!(remote.trigger_typing(CHANNEL).await, Err(RemoteError::Timeout));
        remote.trigger_typing(CHANNEL).await.unwrap();

        assert_eq!(remote.typing_count(), 2);
        assert_eq!(remote.left_channels(), vec![CHANNEL]);
    }

    #[tokio::test]
    async fn failed_request_is_not_logged() {
        let remote = seeded(1..=3);
        remote.fail_next(RemoteError::Timeout);

        let result = remote.fetch_messages(CHANNEL, MessageQuery::latest(3)).await;
        assert!(matches!(result, Err(RemoteError::Timeout)));
        assert!(remote.history_requests().is_empty());
    }

    // ===== Shared State Tests =====

    #[tokio::test]
    async fn clone_shares_state() {
        let remote = MockRemote::new();
        let clone = remote.clone();

        clone.leave_channel(CHANNEL).await.unwrap();
        assert_eq!(remote.left_channels(), vec![CHANNEL]);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let remote = seeded(1..=3);
        remote.trigger_typing(CHANNEL).await.unwrap();
        remote.fail_next(RemoteError::NotFound);
        remote.reset();

        assert_eq!(remote.typing_count(), 0);
        let page = remote
            .fetch_messages(CHANNEL, MessageQuery::latest(10))
            .await
            .unwrap();
        assert!(page.is_empty());
    }
}
