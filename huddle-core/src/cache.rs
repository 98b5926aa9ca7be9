//! Recent-message cache for a group channel.
//!
//! This module provides a bounded cache of recently received messages with:
//! - FIFO eviction by insertion order (not by access)
//! - O(1) point lookup from any thread
//! - A disabled mode (capacity 0) in which every read misses
//!
//! Point reads go straight to the concurrent map. The insertion order lives
//! in a deque behind a short mutex held only by writers and range reads.

use dashmap::DashMap;
use huddle_types::{ChannelId, Direction, MessageId, MessageModel, UserId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Author summary copied from the inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAuthor {
    /// Author identity.
    pub id: UserId,
    /// Author name at send time.
    pub username: String,
}

/// A message as held by the cache or returned by a remote fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identity.
    pub id: MessageId,
    /// Channel the message belongs to.
    pub channel_id: ChannelId,
    /// Author.
    pub author: MessageAuthor,
    /// Content payload. Opaque to the cache.
    pub content: String,
    /// Creation time, unix millis.
    pub timestamp: u64,
    /// Text-to-speech flag.
    pub tts: bool,
    /// Pinned flag.
    pub pinned: bool,
}

impl Message {
    /// Build a message from a decoded payload.
    pub fn from_model(model: &MessageModel) -> Self {
        Self {
            id: model.id,
            channel_id: model.channel_id,
            author: MessageAuthor {
                id: model.author.id,
                username: model.author.username.clone(),
            },
            content: model.content.clone(),
            timestamp: model.timestamp,
            tts: model.tts,
            pinned: model.pinned,
        }
    }
}

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Self::from_model(&model)
    }
}

/// Slots reserved up front. Larger caches grow on demand.
const MAX_PREALLOCATED: usize = 1024;

/// Capacity-bounded FIFO message cache.
///
/// Messages flow through the cache in this order:
/// 1. `add()` - insert at the newest position
/// 2. older entries are evicted once `capacity` is exceeded
/// 3. `remove()` - drop an entry early (delete events)
#[derive(Debug)]
pub struct MessageCache {
    /// Maximum number of cached messages. Zero disables the cache.
    capacity: usize,
    /// Cached messages by id.
    messages: DashMap<MessageId, Arc<Message>>,
    /// Ids in insertion order, oldest at the front.
    order: Mutex<VecDeque<MessageId>>,
}

impl MessageCache {
    /// Create a cache holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let reserved = capacity.min(MAX_PREALLOCATED);
        Self {
            capacity,
            messages: DashMap::with_capacity(reserved + reserved.div_ceil(20)),
            order: Mutex::new(VecDeque::with_capacity(reserved)),
        }
    }

    /// Create a cache that never holds anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Whether caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a cached message.
    pub fn get(&self, id: MessageId) -> Option<Arc<Message>> {
        self.messages.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert a message at the newest position, evicting the oldest entries
    /// past capacity.
    ///
    /// Re-adding a cached id is a no-op; the first copy keeps its position.
    pub fn add(&self, message: Arc<Message>) {
        if !self.is_enabled() {
            return;
        }

        let mut order = self.order();
        let id = message.id;
        if self.messages.contains_key(&id) {
            return;
        }
        self.messages.insert(id, message);
        order.push_back(id);

        while order.len() > self.capacity {
            if let Some(evicted) = order.pop_front() {
                self.messages.remove(&evicted);
                tracing::trace!(message_id = %evicted, "evicted cached message");
            }
        }
    }

    /// Remove a message, returning it if it was cached.
    pub fn remove(&self, id: MessageId) -> Option<Arc<Message>> {
        if !self.is_enabled() {
            return None;
        }

        let mut order = self.order();
        let removed = self.messages.remove(&id).map(|(_, message)| message);
        if removed.is_some() {
            if let Some(position) = order.iter().position(|cached| *cached == id) {
                order.remove(position);
            }
        }
        removed
    }

    /// All cached messages, oldest first.
    pub fn messages(&self) -> Vec<Arc<Message>> {
        let order = self.order();
        order.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Up to `limit` cached messages relative to `from`.
    ///
    /// - no `from`: the newest messages, newest first
    /// - `Before`: ids below `from`, newest first
    /// - `After`: ids above `from`, oldest first
    /// - `Around`: never served from cache (empty)
    ///
    /// Order follows insertion order, which matches id order as long as
    /// messages arrive in the order they were created.
    pub fn get_many(
        &self,
        from: Option<MessageId>,
        direction: Direction,
        limit: usize,
    ) -> Vec<Arc<Message>> {
        if limit == 0 || !self.is_enabled() {
            return Vec::new();
        }

        let order = self.order();
        let ids: Box<dyn Iterator<Item = &MessageId> + '_> = match (from, direction) {
            (_, Direction::Around) => return Vec::new(),
            (None, Direction::After) => Box::new(order.iter()),
            (None, Direction::Before) => Box::new(order.iter().rev()),
            (Some(from), Direction::Before) => {
                Box::new(order.iter().rev().filter(move |id| **id < from))
            }
            (Some(from), Direction::After) => {
                Box::new(order.iter().filter(move |id| **id > from))
            }
        };

        ids.filter_map(|id| self.get(*id)).take(limit).collect()
    }

    /// Drop every cached message.
    pub fn clear(&self) {
        let mut order = self.order();
        order.clear();
        self.messages.clear();
    }

    fn order(&self) -> MutexGuard<'_, VecDeque<MessageId>> {
        // The deque is always left consistent, so a poisoned lock is usable.
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
