//! Transient user-visible notifications (toasts)
//!
//! Each notification auto-dismisses after a fixed duration and can be
//! dismissed manually before that. Its deadline is its own: dismissing a
//! toast never touches the undo window of the commit that raised it, and
//! an expiring undo window never removes the toast.

use std::time::{Duration, Instant};

use crate::models::ThreadId;

/// Identifier for a displayed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

/// A currently-visible toast
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    /// Threads the event concerned, if any (lets the UI scroll-to or
    /// highlight on tap)
    pub thread_ids: Vec<ThreadId>,
    pub expires_at: Instant,
}

/// Ordered list of visible toasts with per-toast expiry
pub struct NotificationDispatcher {
    visible: Vec<Notification>,
    next_id: u64,
    duration: Duration,
}

impl NotificationDispatcher {
    pub fn new(duration: Duration) -> Self {
        Self {
            visible: Vec::new(),
            next_id: 0,
            duration,
        }
    }

    /// Show a toast; it expires `duration` after `now`
    pub fn push(
        &mut self,
        text: impl Into<String>,
        thread_ids: Vec<ThreadId>,
        now: Instant,
    ) -> NotificationId {
        self.next_id += 1;
        let id = NotificationId(self.next_id);
        self.visible.push(Notification {
            id,
            text: text.into(),
            thread_ids,
            expires_at: now + self.duration,
        });
        id
    }

    /// Manually dismiss a toast before expiry. Returns whether it was
    /// still visible.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.id != id);
        self.visible.len() != before
    }

    /// Drop every toast whose deadline has passed
    pub fn expire(&mut self, now: Instant) {
        self.visible.retain(|n| n.expires_at > now);
    }

    /// Currently visible toasts, oldest first
    pub fn visible(&self) -> &[Notification] {
        &self.visible
    }
}
