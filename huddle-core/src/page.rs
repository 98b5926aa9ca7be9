//! History page planning.
//!
//! Deciding how a history read splits between the message cache and the
//! remote history endpoint is pure logic and lives here. The client turns a
//! [`PagePlan`] into a lazy stream: it yields the cached batch first (if
//! any), then drives a [`RemotePager`] one request at a time.
//!
//! Rules:
//! - `Around` is never served from cache.
//! - `After` with no starting message reads nothing.
//! - `Before`, or any read under [`ReadPolicy::CacheOnly`], starts from the
//!   cache. Cache-only stops there.
//! - `Before` continues remotely from the oldest cached message (or the
//!   caller's start if nothing was cached) for whatever the cache could not
//!   supply.
//! - `After` with downloads allowed skips the cache entirely.

use huddle_types::{Direction, MessageId, MessageQuery, ReadPolicy};
use std::sync::Arc;

use crate::cache::{Message, MessageCache};

/// How one history read is served.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    /// Batch served from cache, newest first for `Before`.
    pub cached: Vec<Arc<Message>>,
    /// Remaining read to issue remotely.
    pub remote: Option<MessageQuery>,
}

impl PagePlan {
    /// Split `query` between `cache` and the remote endpoint.
    pub fn new(cache: &MessageCache, query: MessageQuery, policy: ReadPolicy) -> Self {
        if query.limit == 0 {
            return Self::default();
        }

        match (query.direction, policy) {
            (Direction::Around, ReadPolicy::CacheOnly) => Self::default(),
            (Direction::Around, ReadPolicy::AllowDownload) => Self {
                cached: Vec::new(),
                remote: Some(query),
            },
            (Direction::After, _) if query.from.is_none() => Self::default(),
            (Direction::After, ReadPolicy::AllowDownload) => Self {
                cached: Vec::new(),
                remote: Some(query),
            },
            (Direction::After, ReadPolicy::CacheOnly) => Self {
                cached: cache.get_many(query.from, Direction::After, query.limit),
                remote: None,
            },
            (Direction::Before, _) => {
                let cached = cache.get_many(query.from, Direction::Before, query.limit);
                let remaining = query.limit.saturating_sub(cached.len());
                let remote = (policy == ReadPolicy::AllowDownload && remaining > 0).then(|| {
                    let oldest = cached.iter().map(|message| message.id).min();
                    MessageQuery {
                        from: oldest.or(query.from),
                        direction: Direction::Before,
                        limit: remaining,
                    }
                });
                Self { cached, remote }
            }
        }
    }

    /// True if the read yields nothing at all.
    pub fn is_empty(&self) -> bool {
        self.cached.is_empty() && self.remote.is_none()
    }
}

/// Walks a remote read one request at a time.
///
/// Each request asks for at most `batch_size` messages. After a batch the
/// cursor moves to the oldest (`Before`) or newest (`After`) id received.
/// The walk ends when the total is reached, a batch comes back short, or
/// after the single request an `Around` read makes.
#[derive(Debug, Clone)]
pub struct RemotePager {
    from: Option<MessageId>,
    direction: Direction,
    remaining: usize,
    batch_size: usize,
    done: bool,
}

impl RemotePager {
    /// Start walking `query` in batches of `batch_size`.
    pub fn new(query: MessageQuery, batch_size: usize) -> Self {
        Self {
            from: query.from,
            direction: query.direction,
            remaining: query.limit,
            batch_size: batch_size.max(1),
            done: query.limit == 0,
        }
    }

    /// The next request to issue, or `None` when the walk is over.
    pub fn next_request(&self) -> Option<MessageQuery> {
        if self.done {
            return None;
        }
        Some(MessageQuery {
            from: self.from,
            direction: self.direction,
            limit: self.remaining.min(self.batch_size),
        })
    }

    /// Record the batch returned for the last request.
    pub fn advance(&mut self, batch: &[Arc<Message>]) {
        let requested = self.remaining.min(self.batch_size);
        self.remaining = self.remaining.saturating_sub(batch.len());

        let next_from = match self.direction {
            Direction::Before => batch.iter().map(|message| message.id).min(),
            Direction::After => batch.iter().map(|message| message.id).max(),
            Direction::Around => None,
        };
        if next_from.is_some() {
            self.from = next_from;
        }

        self.done = self.remaining == 0
            || batch.len() < requested
            || self.direction == Direction::Around;
    }

    /// Stop without issuing more requests.
    pub fn finish(&mut self) {
        self.done = true;
    }

    /// Whether the walk is over.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MessageAuthor;
    use huddle_types::{ChannelId, UserId};

    fn message(id: u64) -> Arc<Message> {
        Arc::new(Message {
            id: MessageId::new(id),
            channel_id: ChannelId::new(1),
            author: MessageAuthor {
                id: UserId::new(2),
                username: "ana".to_string(),
            },
            content: String::new(),
            timestamp: 0,
            tts: false,
            pinned: false,
        })
    }

    fn cache_with(ids: std::ops::RangeInclusive<u64>) -> MessageCache {
        let cache = MessageCache::new(100);
        for id in ids {
            cache.add(message(id));
        }
        cache
    }

    fn batch(ids: impl IntoIterator<Item = u64>) -> Vec<Arc<Message>> {
        ids.into_iter().map(message).collect()
    }

    #[test]
    fn fully_cached_read_stays_local() {
        let cache = cache_with(1..=10);
        let plan = PagePlan::new(&cache, MessageQuery::latest(5), ReadPolicy::AllowDownload);

        assert_eq!(plan.cached.len(), 5);
        assert!(plan.remote.is_none());
    }

    #[test]
    fn partial_cache_continues_from_oldest_cached() {
        let cache = cache_with(8..=10);
        let plan = PagePlan::new(&cache, MessageQuery::latest(5), ReadPolicy::AllowDownload);

        assert_eq!(plan.cached.len(), 3);
        let remote = plan.remote.unwrap();
        assert_eq!(remote.from, Some(MessageId::new(8)));
        assert_eq!(remote.direction, Direction::Before);
        assert_eq!(remote.limit, 2);
    }

    #[test]
    fn empty_cache_continues_from_callers_start() {
        let cache = MessageCache::disabled();
        let query = MessageQuery::starting_at(MessageId::new(50), Direction::Before, 30);
        let plan = PagePlan::new(&cache, query, ReadPolicy::AllowDownload);

        assert!(plan.cached.is_empty());
        assert_eq!(plan.remote, Some(query));
    }

    #[test]
    fn cache_only_never_goes_remote() {
        let cache = cache_with(8..=10);
        let plan = PagePlan::new(&cache, MessageQuery::latest(5), ReadPolicy::CacheOnly);

        assert_eq!(plan.cached.len(), 3);
        assert!(plan.remote.is_none());
    }

    #[test]
    fn after_with_download_skips_cache() {
        let cache = cache_with(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(3), Direction::After, 4);
        let plan = PagePlan::new(&cache, query, ReadPolicy::AllowDownload);

        assert!(plan.cached.is_empty());
        assert_eq!(plan.remote, Some(query));
    }

    #[test]
    fn after_cache_only_reads_cache() {
        let cache = cache_with(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(3), Direction::After, 4);
        let plan = PagePlan::new(&cache, query, ReadPolicy::CacheOnly);

        let ids: Vec<u64> = plan.cached.iter().map(|m| m.id.get()).collect();
        assert_eq!(ids, vec![4, 5, 6, 7]);
        assert!(plan.remote.is_none());
    }

    #[test]
    fn after_without_start_is_empty() {
        let cache = cache_with(1..=10);
        let query = MessageQuery {
            from: None,
            direction: Direction::After,
            limit: 10,
        };
        assert!(PagePlan::new(&cache, query, ReadPolicy::AllowDownload).is_empty());
    }

    #[test]
    fn around_is_remote_only() {
        let cache = cache_with(1..=10);
        let query = MessageQuery::starting_at(MessageId::new(5), Direction::Around, 4);

        assert!(PagePlan::new(&cache, query, ReadPolicy::CacheOnly).is_empty());
        let plan = PagePlan::new(&cache, query, ReadPolicy::AllowDownload);
        assert!(plan.cached.is_empty());
        assert_eq!(plan.remote, Some(query));
    }

    #[test]
    fn zero_limit_is_empty() {
        let cache = cache_with(1..=10);
        assert!(PagePlan::new(&cache, MessageQuery::latest(0), ReadPolicy::AllowDownload).is_empty());
    }

    #[test]
    fn pager_splits_into_batches() {
        let query = MessageQuery::starting_at(MessageId::new(1000), Direction::Before, 250);
        let mut pager = RemotePager::new(query, 100);

        let first = pager.next_request().unwrap();
        assert_eq!(first.limit, 100);
        assert_eq!(first.from, Some(MessageId::new(1000)));
        pager.advance(&batch(900..1000));

        let second = pager.next_request().unwrap();
        assert_eq!(second.limit, 100);
        assert_eq!(second.from, Some(MessageId::new(900)));
        pager.advance(&batch(800..900));

        let third = pager.next_request().unwrap();
        assert_eq!(third.limit, 50);
        pager.advance(&batch(750..800));

        assert!(pager.is_done());
        assert!(pager.next_request().is_none());
    }

    #[test]
    fn pager_stops_on_short_batch() {
        let query = MessageQuery::starting_at(MessageId::new(10), Direction::After, 500);
        let mut pager = RemotePager::new(query, 100);

        pager.advance(&batch(11..=50));
        assert!(pager.is_done());
    }

    #[test]
    fn pager_after_moves_to_newest() {
        let query = MessageQuery::starting_at(MessageId::new(10), Direction::After, 4);
        let mut pager = RemotePager::new(query, 2);

        pager.advance(&batch([11, 12]));
        assert_eq!(pager.next_request().unwrap().from, Some(MessageId::new(12)));
    }

    #[test]
    fn pager_around_issues_one_request() {
        let query = MessageQuery::starting_at(MessageId::new(10), Direction::Around, 50);
        let mut pager = RemotePager::new(query, 100);

        assert_eq!(pager.next_request().unwrap().limit, 50);
        pager.advance(&batch(1..=50));
        assert!(pager.next_request().is_none());
    }
}
