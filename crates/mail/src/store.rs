//! Read-only projection of authoritative server state for one view
//!
//! The store receives ordered thread snapshots from the live feed and holds
//! them untouched: it has no mutation awareness. Pending local state lives
//! entirely in the overlay and is merged at projection time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Category, LabelId, Message, MessageId, Thread, ThreadId};

/// Identifies the logical view a session displays: a category, a label, a
/// search, or the combined inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewFilter {
    Category(Category),
    Label(LabelId),
    Search(String),
    Combined,
}

impl ViewFilter {
    /// The category this view shows, if it is a category view.
    ///
    /// A pending category move hides its thread only in the move's origin
    /// category view, so only category views ever match.
    pub fn category(&self) -> Option<Category> {
        match self {
            ViewFilter::Category(c) => Some(*c),
            _ => None,
        }
    }
}

/// Holds the latest server snapshot of threads for one view.
///
/// Threads are stored behind `Arc` and a new snapshot reuses the previous
/// allocation for any thread it did not change, so downstream consumers
/// that memoize by identity see changes only where the server actually
/// changed something.
pub struct ThreadStore {
    threads: Vec<Arc<Thread>>,
    by_id: HashMap<ThreadId, Arc<Thread>>,
    messages: HashMap<ThreadId, Vec<Message>>,
    snapshot_seq: u64,
}

impl ThreadStore {
    /// Create an empty store (no snapshot received yet)
    pub fn new() -> Self {
        Self {
            threads: Vec::new(),
            by_id: HashMap::new(),
            messages: HashMap::new(),
            snapshot_seq: 0,
        }
    }

    /// Replace the held snapshot with a new one from the feed.
    ///
    /// Order is the server's. Threads equal to their previous snapshot keep
    /// their existing allocation.
    pub fn apply_snapshot(&mut self, threads: Vec<Thread>) {
        let mut next = Vec::with_capacity(threads.len());
        let mut next_by_id = HashMap::with_capacity(threads.len());

        for thread in threads {
            let arc = match self.by_id.get(&thread.id) {
                Some(existing) if **existing == thread => Arc::clone(existing),
                _ => Arc::new(thread),
            };
            next_by_id.insert(arc.id.clone(), Arc::clone(&arc));
            next.push(arc);
        }

        // Lazily-fetched messages for threads the server no longer returns
        // are dropped with them.
        self.messages.retain(|id, _| next_by_id.contains_key(id));

        self.threads = next;
        self.by_id = next_by_id;
        self.snapshot_seq += 1;
    }

    /// The held snapshot, in server order
    pub fn threads(&self) -> &[Arc<Thread>] {
        &self.threads
    }

    /// Look up a thread by id
    pub fn get(&self, id: &ThreadId) -> Option<&Arc<Thread>> {
        self.by_id.get(id)
    }

    /// Number of snapshots applied so far
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq
    }

    /// Expand a thread to its member message identifiers.
    ///
    /// This is the thread-intent → message-call translation used when
    /// batching backend mutations. Unknown threads expand to nothing.
    pub fn message_ids_for_thread(&self, id: &ThreadId) -> Vec<MessageId> {
        self.by_id
            .get(id)
            .map(|t| t.message_ids.clone())
            .unwrap_or_default()
    }

    /// Cache lazily-fetched messages for a thread
    pub fn insert_messages(&mut self, thread_id: ThreadId, messages: Vec<Message>) {
        self.messages.insert(thread_id, messages);
    }

    /// Cached messages for a thread, if fetched
    pub fn messages_for_thread(&self, id: &ThreadId) -> Option<&[Message]> {
        self.messages.get(id).map(|m| m.as_slice())
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}
