//! Deferred destructive commits with an undo window
//!
//! A destructive action (mark done, delete) takes effect in the overlay
//! immediately but reaches the backend only after a per-kind delay. Until
//! the deadline passes the commit can be cancelled, which reverts the
//! overlay flags it set. Deadlines are plain `Instant`s evaluated by the
//! host loop's tick: nothing here spawns timers.

use std::time::{Duration, Instant};

use crate::models::{MessageId, ThreadId};

/// The two mutation kinds that get an undo window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestructiveKind {
    Done,
    Delete,
}

impl DestructiveKind {
    /// Human-readable verb for notifications
    pub fn verb(&self) -> &'static str {
        match self {
            DestructiveKind::Done => "Marked done",
            DestructiveKind::Delete => "Deleted",
        }
    }
}

/// Opaque handle to a scheduled commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitHandle(u64);

/// An in-flight undoable action
#[derive(Debug, Clone)]
pub struct PendingCommit {
    pub handle: CommitHandle,
    pub kind: DestructiveKind,
    /// Affected threads, in action order
    pub thread_ids: Vec<ThreadId>,
    /// Member message ids derived at scheduling time, sent at fire time
    pub message_ids: Vec<MessageId>,
    /// When the undo window closes
    pub fire_at: Instant,
}

impl PendingCommit {
    /// Time left in the undo window (zero once due)
    pub fn remaining(&self, now: Instant) -> Duration {
        self.fire_at.saturating_duration_since(now)
    }
}

/// Result of scheduling a destructive action
pub struct Scheduled {
    /// Handle of the (possibly coalesced) active commit
    pub handle: CommitHandle,
    /// A previously-active commit of a different kind that cannot be
    /// coalesced: the caller must commit it immediately, with its
    /// original identifier set. Never silently dropped.
    pub displaced: Option<PendingCommit>,
}

/// Schedules deferred destructive commits, at most one active at a time.
///
/// Only one pending commit is ever bound to the visible undo affordance:
/// scheduling while one is active replaces it. Same kind → the sets merge
/// under a fresh deadline and the old deadline never fires on its own;
/// different kind → the old commit is displaced for immediate commit.
#[derive(Default)]
pub struct UndoScheduler {
    active: Option<PendingCommit>,
    next_handle: u64,
}

impl UndoScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active pending commit, if its window is still open
    pub fn active(&self) -> Option<&PendingCommit> {
        self.active.as_ref()
    }

    /// Schedule a destructive commit to fire after `window`
    pub fn schedule(
        &mut self,
        kind: DestructiveKind,
        thread_ids: Vec<ThreadId>,
        message_ids: Vec<MessageId>,
        window: Duration,
        now: Instant,
    ) -> Scheduled {
        let mut thread_ids = thread_ids;
        let mut message_ids = message_ids;
        let mut displaced = None;

        if let Some(prev) = self.active.take() {
            if prev.kind == kind {
                // Coalesce: the replacement covers the union and the
                // earlier deadline is abandoned
                thread_ids = union(prev.thread_ids, thread_ids);
                message_ids = union(prev.message_ids, message_ids);
            } else {
                displaced = Some(prev);
            }
        }

        self.next_handle += 1;
        let handle = CommitHandle(self.next_handle);
        self.active = Some(PendingCommit {
            handle,
            kind,
            thread_ids,
            message_ids,
            fire_at: now + window,
        });

        Scheduled { handle, displaced }
    }

    /// Cancel a scheduled commit before it fires.
    ///
    /// Returns the commit so the caller can revert the overlay flags it
    /// set. No-op (returns `None`) if the commit already fired or was
    /// replaced.
    pub fn cancel(&mut self, handle: CommitHandle) -> Option<PendingCommit> {
        match &self.active {
            Some(active) if active.handle == handle => self.active.take(),
            _ => None,
        }
    }

    /// Take the active commit if its window has elapsed
    pub fn poll_due(&mut self, now: Instant) -> Option<PendingCommit> {
        if self.active.as_ref().is_some_and(|c| c.fire_at <= now) {
            self.active.take()
        } else {
            None
        }
    }

    /// Take the active commit regardless of its deadline (view teardown:
    /// the pending action commits rather than silently evaporating)
    pub fn flush(&mut self) -> Option<PendingCommit> {
        self.active.take()
    }
}

fn union<T: PartialEq>(mut base: Vec<T>, extra: Vec<T>) -> Vec<T> {
    for item in extra {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}
