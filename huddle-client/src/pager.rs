//! Lazy paginated history.
//!
//! A history read becomes a [`MessagePages`] stream. The cached batch (if
//! any) is yielded first without touching the network; remote batches are
//! fetched one at a time, only when the consumer polls for the next one.

use futures_util::stream::{self, BoxStream, StreamExt};
use huddle_core::{GroupChannel, Message, PagePlan, RemotePager};
use huddle_types::{ChannelId, MessageQuery, ReadPolicy};
use std::sync::Arc;

use crate::handle::ClientError;
use crate::remote::RemoteChannel;

/// Stream of history batches. Dropping it stops further requests.
pub type MessagePages = BoxStream<'static, Result<Vec<Arc<Message>>, ClientError>>;

enum PageState {
    Start {
        cached: Vec<Arc<Message>>,
        pager: Option<RemotePager>,
    },
    Remote(RemotePager),
    Done,
}

/// Build the stream for one history read.
///
/// The cache part is captured now; remote batches are fetched lazily.
/// Fetched messages are returned to the caller but not cached.
pub fn paged_messages<R>(
    channel: &GroupChannel,
    remote: Arc<R>,
    query: MessageQuery,
    policy: ReadPolicy,
    batch_size: usize,
) -> MessagePages
where
    R: RemoteChannel + 'static,
{
    let plan = PagePlan::new(channel.message_cache(), query, policy);
    let channel_id = channel.id();
    let start = PageState::Start {
        cached: plan.cached,
        pager: plan.remote.map(|query| RemotePager::new(query, batch_size)),
    };

    stream::unfold(start, move |state| {
        let remote = Arc::clone(&remote);
        async move {
            match state {
                PageState::Start { cached, pager } if !cached.is_empty() => {
                    let next = pager.map_or(PageState::Done, PageState::Remote);
                    Some((Ok(cached), next))
                }
                PageState::Start { pager: Some(pager), .. } | PageState::Remote(pager) => {
                    fetch_batch(&*remote, channel_id, pager).await
                }
                PageState::Start { pager: None, .. } | PageState::Done => None,
            }
        }
    })
    .boxed()
}

async fn fetch_batch<R>(
    remote: &R,
    channel_id: ChannelId,
    mut pager: RemotePager,
) -> Option<(Result<Vec<Arc<Message>>, ClientError>, PageState)>
where
    R: RemoteChannel,
{
    let request = pager.next_request()?;

    match remote.fetch_messages(channel_id, request).await {
        Ok(models) => {
            let batch: Vec<Arc<Message>> = models
                .into_iter()
                .map(|model| Arc::new(Message::from(model)))
                .collect();
            pager.advance(&batch);
            tracing::trace!(
                channel_id = %channel_id,
                requested = request.limit,
                received = batch.len(),
                "fetched history batch"
            );

            if batch.is_empty() {
                return None;
            }
            let next = if pager.is_done() {
                PageState::Done
            } else {
                PageState::Remote(pager)
            };
            Some((Ok(batch), next))
        }
        Err(error) => Some((Err(ClientError::Remote(error)), PageState::Done)),
    }
}
