//! Overlay store: pending local state keyed by thread identifier
//!
//! Mutation handlers write here first (optimistic, before any network
//! call); the projection merges the overlay with server snapshots; the
//! reconciler evicts entries the server has confirmed. Writes follow a
//! last-write-wins-per-field discipline: there is no locking to get
//! right because the engine runs on one logical thread.

use std::collections::HashMap;

use log::debug;

use crate::models::{Category, LabelId, Thread, ThreadId};

use super::entry::{CategoryMove, LabelDelta, OverlayEntry};

/// How many conflicting snapshots a read override survives before the
/// server wins. The first conflict is tolerated as a stale in-flight echo
/// (the snapshot may predate our own backend call); the second means
/// another device wrote after us.
const READ_CONFLICT_STRIKE_LIMIT: u8 = 2;

/// Map of per-thread pending state plus reconciliation bookkeeping
#[derive(Default)]
pub struct OverlayStore {
    entries: HashMap<ThreadId, OverlayEntry>,
    read_strikes: HashMap<ThreadId, u8>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending state for a thread, if any
    pub fn entry(&self, id: &ThreadId) -> Option<&OverlayEntry> {
        self.entries.get(id)
    }

    /// Number of threads with pending state
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, id: &ThreadId) -> &mut OverlayEntry {
        self.entries.entry(id.clone()).or_default()
    }

    /// Set the read override for the given threads. Last writer wins:
    /// `true` replaces an earlier `false` and vice versa.
    pub fn set_read_override(&mut self, ids: &[ThreadId], read: bool) {
        for id in ids {
            self.entry_mut(id).read_override = Some(read);
            // A fresh user action restarts conflict tolerance
            self.read_strikes.remove(id);
        }
    }

    /// Set or clear the done flag for the given threads
    pub fn set_done(&mut self, ids: &[ThreadId], done: bool) {
        for id in ids {
            self.entry_mut(id).done = done;
        }
        self.evict_empty(ids);
    }

    /// Set or clear the deleted flag for the given threads
    pub fn set_deleted(&mut self, ids: &[ThreadId], deleted: bool) {
        for id in ids {
            self.entry_mut(id).deleted = deleted;
        }
        self.evict_empty(ids);
    }

    /// Record a pending category move. A second move of the same thread
    /// replaces the first outright.
    pub fn set_category_move(&mut self, id: &ThreadId, from: Category, to: Category) {
        self.entry_mut(id).category_move = Some(CategoryMove { from, to });
    }

    /// Current label delta for a thread (default when none pending).
    ///
    /// Callers that need rollback snapshot this before mutating and restore
    /// it with [`OverlayStore::set_label_delta`] on backend failure.
    pub fn label_delta(&self, id: &ThreadId) -> LabelDelta {
        self.entries
            .get(id)
            .map(|e| e.label_delta.clone())
            .unwrap_or_default()
    }

    /// Replace a thread's label delta wholesale (rollback path)
    pub fn set_label_delta(&mut self, id: &ThreadId, delta: LabelDelta) {
        self.entry_mut(id).label_delta = delta;
        self.evict_empty(std::slice::from_ref(id));
    }

    /// Optimistically apply a label
    pub fn add_label(&mut self, id: &ThreadId, label: LabelId) {
        self.entry_mut(id).label_delta.add(label);
    }

    /// Optimistically remove a label
    pub fn remove_label(&mut self, id: &ThreadId, label: LabelId) {
        self.entry_mut(id).label_delta.remove(label);
        self.evict_empty(std::slice::from_ref(id));
    }

    /// Reconcile pending state against a fresh server snapshot.
    ///
    /// Confirmed fields are evicted so they stop masking future server
    /// changes; a read override that keeps conflicting yields to the
    /// server after [`READ_CONFLICT_STRIKE_LIMIT`] snapshots. `done` and
    /// `deleted` are never evicted while the server still returns the
    /// thread (the server-side removal is asynchronous and the entry must
    /// keep hiding it), but once the thread leaves the snapshot there is
    /// nothing left to hide and the whole entry goes.
    pub fn reconcile(&mut self, server_threads: &[std::sync::Arc<Thread>]) {
        let by_id: HashMap<&ThreadId, &Thread> = server_threads
            .iter()
            .map(|t| (&t.id, t.as_ref()))
            .collect();

        let mut evicted = 0usize;
        self.entries.retain(|id, entry| {
            let Some(server) = by_id.get(id) else {
                // Server no longer returns this thread in the view
                evicted += 1;
                return false;
            };

            if let Some(read) = entry.read_override {
                if server.is_read == read {
                    entry.read_override = None;
                } else {
                    let strikes = self.read_strikes.entry(id.clone()).or_insert(0);
                    *strikes += 1;
                    if *strikes >= READ_CONFLICT_STRIKE_LIMIT {
                        entry.read_override = None;
                    }
                }
            }

            if let Some(mv) = entry.category_move
                && server.category == mv.to
            {
                entry.category_move = None;
            }

            entry
                .label_delta
                .added
                .retain(|l| !server.labels.contains(l));
            entry
                .label_delta
                .removed
                .retain(|l| server.labels.contains(l));

            if entry.is_empty() {
                evicted += 1;
                false
            } else {
                true
            }
        });

        self.read_strikes
            .retain(|id, _| match self.entries.get(id) {
                Some(entry) => entry.read_override.is_some(),
                None => false,
            });

        if evicted > 0 {
            debug!("overlay reconcile evicted {} entries", evicted);
        }
    }

    fn evict_empty(&mut self, ids: &[ThreadId]) {
        for id in ids {
            if self.entries.get(id).is_some_and(|e| e.is_empty()) {
                self.entries.remove(id);
                self.read_strikes.remove(id);
            }
        }
    }
}
