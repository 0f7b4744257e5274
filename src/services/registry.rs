//! Live connection registry
//!
//! Maps a user id to that user's open notification channels. Thread-safe;
//! the raw map never leaves this module.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Serialized event as written to a channel
pub type Frame = Arc<str>;

/// Opaque identifier of one open channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelHandle(u64);

/// Outcome of a single non-blocking write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Subscriber is not draining; this frame is dropped for this channel only
    Full,
    /// Receiver went away
    Closed,
    /// No such channel
    Missing,
}

struct Channel {
    handle: ChannelHandle,
    sender: mpsc::Sender<Frame>,
}

/// Registry of open channels per user
pub struct ConnectionRegistry {
    /// Channels per user, oldest first
    channels: DashMap<String, Vec<Channel>>,
    next_handle: AtomicU64,
    open: AtomicUsize,
    buffer: usize,
    max_per_user: usize,
}

impl ConnectionRegistry {
    /// `buffer` bounds each channel's queue; `max_per_user` bounds each user's channel count
    pub fn new(buffer: usize, max_per_user: usize) -> Self {
        Self {
            channels: DashMap::new(),
            next_handle: AtomicU64::new(1),
            open: AtomicUsize::new(0),
            buffer: buffer.max(1),
            max_per_user: max_per_user.max(1),
        }
    }

    /// Open a new channel for `user_id`
    ///
    /// If the user is already at `max_per_user`, the oldest channel is closed.
    /// Dropping the returned [`Subscription`] unsubscribes it.
    pub fn subscribe(self: &Arc<Self>, user_id: &str) -> Subscription {
        let handle = ChannelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.buffer);

        let mut evicted = 0;
        {
            let mut entry = self.channels.entry(user_id.to_string()).or_default();
            while entry.len() >= self.max_per_user {
                entry.remove(0);
                evicted += 1;
            }
            entry.push(Channel { handle, sender });
        }

        self.open.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.open.fetch_sub(evicted, Ordering::Relaxed);
            debug!("Evicted {} oldest channel(s) for {}", evicted, user_id);
        }

        debug!(
            "Registry: subscribed {} ({:?}), open={}",
            user_id,
            handle,
            self.open.load(Ordering::Relaxed)
        );

        Subscription {
            user_id: user_id.to_string(),
            handle,
            receiver,
            registry: Arc::clone(self),
        }
    }

    /// Remove one channel; returns `false` if it was already gone
    pub fn unsubscribe(&self, user_id: &str, handle: ChannelHandle) -> bool {
        let removed = match self.channels.get_mut(user_id) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|c| c.handle != handle);
                before != entry.len()
            }
            None => false,
        };

        // Shard guard from get_mut is released before this
        self.channels.remove_if(user_id, |_, channels| channels.is_empty());

        if removed {
            self.open.fetch_sub(1, Ordering::Relaxed);
            debug!(
                "Registry: unsubscribed {} ({:?}), open={}",
                user_id,
                handle,
                self.open.load(Ordering::Relaxed)
            );
        }
        removed
    }

    /// Handles of the user's currently open channels, oldest first
    pub fn channels_for(&self, user_id: &str) -> Vec<ChannelHandle> {
        self.channels
            .get(user_id)
            .map(|entry| entry.iter().map(|c| c.handle).collect())
            .unwrap_or_default()
    }

    /// Non-blocking write of `frame` to one channel
    pub fn try_send(&self, user_id: &str, handle: ChannelHandle, frame: &Frame) -> SendOutcome {
        let Some(entry) = self.channels.get(user_id) else {
            return SendOutcome::Missing;
        };
        let Some(channel) = entry.iter().find(|c| c.handle == handle) else {
            return SendOutcome::Missing;
        };

        match channel.sender.try_send(Arc::clone(frame)) {
            Ok(()) => SendOutcome::Delivered,
            Err(TrySendError::Full(_)) => SendOutcome::Full,
            Err(TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    pub fn open_channels(&self) -> usize {
        self.open.load(Ordering::Relaxed)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(32, 8)
    }
}

/// Receiving half of one registered channel
pub struct Subscription {
    user_id: String,
    handle: ChannelHandle,
    receiver: mpsc::Receiver<Frame>,
    registry: Arc<ConnectionRegistry>,
}

impl Subscription {
    pub fn handle(&self) -> ChannelHandle {
        self.handle
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Next frame; `None` once the registry dropped this channel
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.user_id, self.handle);
    }
}
