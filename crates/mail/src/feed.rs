//! Live thread-snapshot feed boundary
//!
//! The authoritative stream is a provided service; the engine only consumes
//! it. A subscription is keyed by view filter and delivers full ordered
//! snapshots whenever the server state changes. Dropping (or explicitly
//! unsubscribing) the returned guard detaches the feed.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use crate::models::Thread;
use crate::store::ViewFilter;

/// Guard for an active feed subscription.
///
/// Unsubscribes when dropped; [`FeedSubscription::unsubscribe`] does the
/// same thing eagerly and by name.
pub struct FeedSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl FeedSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the feed now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Subscription-based feed of ordered thread snapshots, keyed by view filter
pub trait ThreadFeed: Send + Sync {
    /// Subscribe to snapshots for one view.
    ///
    /// Snapshots arrive on the returned receiver; the guard detaches the
    /// subscription when dropped.
    fn subscribe(&self, filter: ViewFilter) -> (FeedSubscription, Receiver<Vec<Thread>>);
}

struct FeedInner {
    next_id: u64,
    subscribers: HashMap<u64, (ViewFilter, Sender<Vec<Thread>>)>,
}

/// Channel-backed [`ThreadFeed`] for tests and local tooling.
///
/// `publish` fans a snapshot out to every subscriber whose filter matches.
#[derive(Clone)]
pub struct InMemoryFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner {
                next_id: 0,
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Deliver a snapshot to all subscribers of the given view
    pub fn publish(&self, filter: &ViewFilter, threads: Vec<Thread>) {
        let inner = self.inner.lock().unwrap();
        for (sub_filter, tx) in inner.subscribers.values() {
            if sub_filter == filter {
                // A receiver dropped without unsubscribing is not an error
                let _ = tx.send(threads.clone());
            }
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

impl Default for InMemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadFeed for InMemoryFeed {
    fn subscribe(&self, filter: ViewFilter) -> (FeedSubscription, Receiver<Vec<Thread>>) {
        let (tx, rx) = channel();
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.insert(id, (filter, tx));
            id
        };

        let inner = Arc::clone(&self.inner);
        let subscription = FeedSubscription::new(move || {
            inner.lock().unwrap().subscribers.remove(&id);
        });

        (subscription, rx)
    }
}
