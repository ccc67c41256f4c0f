//! Translates thread-level intents into batched backend calls
//!
//! Thread identifiers are expanded to their member message identifiers
//! via the thread store, then sent as exactly one batched call per
//! mutation kind. Destructive-commit failures are logged and swallowed:
//! the UI has already hidden the thread, and re-surfacing it would be
//! more confusing than background drift until the next full resync.

use std::sync::Arc;

use log::{info, warn};

use crate::api::{MutationApi, MutationError};
use crate::models::{LabelId, MessageId, ThreadId};
use crate::store::ThreadStore;
use crate::undo::{DestructiveKind, PendingCommit};

/// Issues backend mutations derived from thread-level intents
pub struct BatchCommitCoordinator {
    api: Arc<dyn MutationApi>,
}

impl BatchCommitCoordinator {
    pub fn new(api: Arc<dyn MutationApi>) -> Self {
        Self { api }
    }

    /// Expand thread ids to their member message ids, deduplicated and in
    /// thread order
    pub fn expand(store: &ThreadStore, thread_ids: &[ThreadId]) -> Vec<MessageId> {
        let mut message_ids = Vec::new();
        for thread_id in thread_ids {
            for msg_id in store.message_ids_for_thread(thread_id) {
                if !message_ids.contains(&msg_id) {
                    message_ids.push(msg_id);
                }
            }
        }
        message_ids
    }

    /// Issue the batched backend call for a fired destructive commit.
    ///
    /// Failure is logged; overlay flags are NOT reverted (accepted
    /// inconsistency, corrected by the next full server snapshot).
    pub fn commit_destructive(&self, commit: &PendingCommit) {
        if commit.message_ids.is_empty() {
            return;
        }

        info!(
            "committing {:?} for {} threads ({} messages)",
            commit.kind,
            commit.thread_ids.len(),
            commit.message_ids.len()
        );

        let result = match commit.kind {
            DestructiveKind::Done => self.api.mark_done(&commit.message_ids),
            DestructiveKind::Delete => self.api.delete(&commit.message_ids),
        };

        if let Err(e) = result {
            warn!("{:?} commit failed, leaving overlay as-is: {}", commit.kind, e);
        }
    }

    /// Fire-and-forget read-state call (no undo window, no rollback)
    pub fn send_read_state(&self, message_ids: &[MessageId], read: bool) {
        if message_ids.is_empty() {
            return;
        }

        let result = if read {
            self.api.mark_read(message_ids)
        } else {
            self.api.mark_unread(message_ids)
        };

        if let Err(e) = result {
            warn!(
                "mark {} failed for {} messages: {}",
                if read { "read" } else { "unread" },
                message_ids.len(),
                e
            );
        }
    }

    /// Single-item label apply. The result is returned so the caller can
    /// roll the optimistic delta back.
    pub fn apply_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.api.apply_label(thread_id, label_id)
    }

    /// Single-item label remove, same rollback contract as apply
    pub fn remove_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.api.remove_label(thread_id, label_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RecordedCall, RecordingMutationApi};
    use crate::models::Thread;
    use std::time::Instant;

    fn make_store(threads: Vec<(&str, Vec<&str>)>) -> ThreadStore {
        let mut store = ThreadStore::new();
        store.apply_snapshot(
            threads
                .into_iter()
                .map(|(id, msgs)| {
                    Thread::builder(id)
                        .message_ids(msgs.into_iter().map(MessageId::new).collect())
                        .build()
                })
                .collect(),
        );
        store
    }

    fn make_commit(kind: DestructiveKind, threads: &[&str], msgs: &[&str]) -> PendingCommit {
        // Handle and deadline are irrelevant once the commit has fired
        let mut sched = crate::undo::UndoScheduler::new();
        let s = sched.schedule(
            kind,
            threads.iter().map(|s| ThreadId::new(*s)).collect(),
            msgs.iter().map(|s| MessageId::new(*s)).collect(),
            std::time::Duration::ZERO,
            Instant::now(),
        );
        let commit = sched.flush().unwrap();
        assert_eq!(commit.handle, s.handle);
        commit
    }

    #[test]
    fn test_expand_dedups_across_threads() {
        let store = make_store(vec![
            ("t1", vec!["m1", "m2"]),
            ("t2", vec!["m2", "m3"]),
        ]);

        let ids = BatchCommitCoordinator::expand(
            &store,
            &[ThreadId::new("t1"), ThreadId::new("t2")],
        );
        assert_eq!(
            ids,
            vec![MessageId::new("m1"), MessageId::new("m2"), MessageId::new("m3")]
        );
    }

    #[test]
    fn test_commit_issues_one_batched_call() {
        let api = Arc::new(RecordingMutationApi::new());
        let coordinator = BatchCommitCoordinator::new(api.clone());

        let commit = make_commit(DestructiveKind::Delete, &["t1", "t2"], &["m1", "m2", "m3"]);
        coordinator.commit_destructive(&commit);

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            RecordedCall::Delete(vec![
                MessageId::new("m1"),
                MessageId::new("m2"),
                MessageId::new("m3")
            ])
        );
    }

    #[test]
    fn test_commit_failure_is_swallowed() {
        let api = Arc::new(RecordingMutationApi::new());
        let coordinator = BatchCommitCoordinator::new(api.clone());
        api.fail_next(MutationError::network("offline"));

        let commit = make_commit(DestructiveKind::Done, &["t1"], &["m1"]);
        // Must not panic or propagate
        coordinator.commit_destructive(&commit);
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn test_empty_commit_issues_nothing() {
        let api = Arc::new(RecordingMutationApi::new());
        let coordinator = BatchCommitCoordinator::new(api.clone());

        let commit = make_commit(DestructiveKind::Delete, &["t1"], &[]);
        coordinator.commit_destructive(&commit);
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn test_read_state_routing() {
        let api = Arc::new(RecordingMutationApi::new());
        let coordinator = BatchCommitCoordinator::new(api.clone());

        coordinator.send_read_state(&[MessageId::new("m1")], true);
        coordinator.send_read_state(&[MessageId::new("m2")], false);

        let calls = api.calls();
        assert_eq!(calls[0], RecordedCall::MarkRead(vec![MessageId::new("m1")]));
        assert_eq!(calls[1], RecordedCall::MarkUnread(vec![MessageId::new("m2")]));
    }
}
