//! Scoped typing indicator.

use huddle_types::ChannelId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::remote::RemoteChannel;

/// Keeps the typing indicator visible while held.
///
/// The indicator is sent immediately and then every `interval` until the
/// guard is dropped. Failures are logged and the loop keeps going.
/// Must be created inside a Tokio runtime.
#[must_use = "the typing indicator stops when the guard is dropped"]
#[derive(Debug)]
pub struct TypingGuard {
    channel_id: ChannelId,
    task: JoinHandle<()>,
}

impl TypingGuard {
    pub(crate) fn start<R>(remote: Arc<R>, channel_id: ChannelId, interval: Duration) -> Self
    where
        R: RemoteChannel + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(error) = remote.trigger_typing(channel_id).await {
                    tracing::warn!(channel_id = %channel_id, %error, "typing indicator failed");
                }
            }
        });
        tracing::debug!(channel_id = %channel_id, "typing started");
        Self { channel_id, task }
    }

    /// Channel the indicator is shown in.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Stop the indicator now.
    pub fn stop(self) {}
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(channel_id = %self.channel_id, "typing stopped");
    }
}
