//! Per-view session facade
//!
//! One `MailboxSession` is constructed per visible view (a category, a
//! label, a search, or the combined inbox) and torn down with it; overlay
//! state never leaks across views. The host event loop feeds it key
//! presses and calls [`MailboxSession::tick`] every frame; the session
//! owns the store, overlay, selection, undo scheduler, and notifications,
//! and exposes exactly the state the rendering layer consumes.
//!
//! Every mutation updates the overlay before any network call is issued:
//! the UI-visible effect is observable first, and a later mutation on the
//! same thread always overrides an earlier one's overlay fields no matter
//! what the earlier network call is doing.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use log::warn;

use crate::api::{MutationApi, MutationError};
use crate::commit::BatchCommitCoordinator;
use crate::config::EngineConfig;
use crate::feed::{FeedSubscription, ThreadFeed};
use crate::input::{Action, KeyPress, ShortcutContext, ShortcutInterpreter};
use crate::models::{Category, LabelId, Message, Thread, ThreadId};
use crate::notify::{Notification, NotificationDispatcher, NotificationId};
use crate::overlay::{OverlayStore, project};
use crate::selection::{SelectionController, SelectionState};
use crate::store::{ThreadStore, ViewFilter};
use crate::undo::{CommitHandle, DestructiveKind, PendingCommit, UndoScheduler};

/// Transient error state on a toggled label chip (not a toast)
#[derive(Debug, Clone)]
pub struct LabelError {
    pub thread_id: ThreadId,
    pub label_id: LabelId,
    pub expires_at: Instant,
}

/// The engine facade for one mailbox view
pub struct MailboxSession {
    view: ViewFilter,
    config: EngineConfig,
    store: ThreadStore,
    overlay: OverlayStore,
    selection: SelectionController,
    scheduler: UndoScheduler,
    notifications: NotificationDispatcher,
    coordinator: BatchCommitCoordinator,
    shortcuts: ShortcutInterpreter,
    label_errors: Vec<LabelError>,
    feed: Option<(FeedSubscription, Receiver<Vec<Thread>>)>,
}

impl MailboxSession {
    pub fn new(view: ViewFilter, config: EngineConfig, api: Arc<dyn MutationApi>) -> Self {
        let notifications = NotificationDispatcher::new(config.toast_duration());
        let shortcuts = ShortcutInterpreter::new(config.chord_timeout());
        Self {
            view,
            config,
            store: ThreadStore::new(),
            overlay: OverlayStore::new(),
            selection: SelectionController::new(),
            scheduler: UndoScheduler::new(),
            notifications,
            coordinator: BatchCommitCoordinator::new(api),
            shortcuts,
            label_errors: Vec::new(),
            feed: None,
        }
    }

    /// The view this session displays
    pub fn view(&self) -> &ViewFilter {
        &self.view
    }

    /// Subscribe to the live stream for this session's view. Snapshots are
    /// drained and applied by [`MailboxSession::tick`]. Replaces any
    /// previous subscription.
    pub fn attach_feed(&mut self, feed: &dyn ThreadFeed) {
        let (subscription, rx) = feed.subscribe(self.view.clone());
        self.feed = Some((subscription, rx));
    }

    /// Apply an authoritative snapshot: store it, evict confirmed overlay
    /// state, and drop checked threads that are no longer visible.
    pub fn apply_snapshot(&mut self, threads: Vec<Thread>) {
        self.store.apply_snapshot(threads);
        self.overlay.reconcile(self.store.threads());
        let visible = self.visible_ids();
        self.selection.retain_visible(&visible);
    }

    // ========================================================================
    // State exposed to the rendering layer
    // ========================================================================

    /// The overlay-merged thread list, in server order.
    ///
    /// Threads the overlay did not change keep their allocation across
    /// calls and snapshots, so identity-based memoization downstream works.
    pub fn display_threads(&self) -> Vec<Arc<Thread>> {
        project(self.store.threads(), &self.overlay, &self.view)
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// The pending commit bound to the visible undo affordance, if any
    pub fn active_pending_commit(&self) -> Option<&PendingCommit> {
        self.scheduler.active()
    }

    /// Currently visible toasts, oldest first
    pub fn notifications(&self) -> &[Notification] {
        self.notifications.visible()
    }

    /// Label chips currently in a transient error state
    pub fn label_errors(&self) -> &[LabelError] {
        &self.label_errors
    }

    /// Cached lazily-fetched messages for a thread, if present
    pub fn messages_for_thread(&self, id: &ThreadId) -> Option<&[Message]> {
        self.store.messages_for_thread(id)
    }

    /// Cache lazily-fetched messages for a thread
    pub fn insert_messages(&mut self, thread_id: ThreadId, messages: Vec<Message>) {
        self.store.insert_messages(thread_id, messages);
    }

    fn visible_ids(&self) -> Vec<ThreadId> {
        self.display_threads()
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn toggle_selection(&mut self, id: ThreadId) {
        self.selection.toggle(id);
    }

    pub fn long_press(&mut self, id: ThreadId) {
        self.selection.long_press(id);
    }

    pub fn select_all_visible(&mut self) {
        let visible = self.visible_ids();
        self.selection.select_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ========================================================================
    // Mutations (overlay first, network second)
    // ========================================================================

    /// Mark threads read. Synchronous, no undo window, no notification;
    /// reversible by marking unread again.
    pub fn mark_read(&mut self, ids: &[ThreadId]) {
        self.set_read_state(ids, true);
    }

    /// Mark threads unread (see [`MailboxSession::mark_read`])
    pub fn mark_unread(&mut self, ids: &[ThreadId]) {
        self.set_read_state(ids, false);
    }

    fn set_read_state(&mut self, ids: &[ThreadId], read: bool) {
        if ids.is_empty() {
            return;
        }
        self.overlay.set_read_override(ids, read);
        let message_ids = BatchCommitCoordinator::expand(&self.store, ids);
        self.coordinator.send_read_state(&message_ids, read);
    }

    /// Mark threads done: hidden immediately, committed after the
    /// configured window unless undone.
    pub fn mark_done(&mut self, ids: Vec<ThreadId>, now: Instant) -> CommitHandle {
        self.schedule_destructive(DestructiveKind::Done, ids, now)
    }

    /// Delete threads: hidden immediately, committed after the configured
    /// window unless undone.
    pub fn delete(&mut self, ids: Vec<ThreadId>, now: Instant) -> CommitHandle {
        self.schedule_destructive(DestructiveKind::Delete, ids, now)
    }

    fn schedule_destructive(
        &mut self,
        kind: DestructiveKind,
        ids: Vec<ThreadId>,
        now: Instant,
    ) -> CommitHandle {
        match kind {
            DestructiveKind::Done => self.overlay.set_done(&ids, true),
            DestructiveKind::Delete => self.overlay.set_deleted(&ids, true),
        }

        let message_ids = BatchCommitCoordinator::expand(&self.store, &ids);
        let count = ids.len();
        let scheduled = self.scheduler.schedule(
            kind,
            ids.clone(),
            message_ids,
            self.config.undo_window(kind),
            now,
        );

        // A pending commit of another kind cannot be coalesced; it fires
        // now with its original identifier set
        if let Some(displaced) = scheduled.displaced {
            self.coordinator.commit_destructive(&displaced);
        }

        let noun = if count == 1 {
            "conversation"
        } else {
            "conversations"
        };
        self.notifications
            .push(format!("{} {} {}", kind.verb(), count, noun), ids, now);

        scheduled.handle
    }

    /// Cancel a scheduled destructive commit, restoring pre-mutation
    /// visibility. No-op if it already fired or was replaced.
    pub fn cancel(&mut self, handle: CommitHandle) -> bool {
        let Some(commit) = self.scheduler.cancel(handle) else {
            return false;
        };
        match commit.kind {
            DestructiveKind::Done => self.overlay.set_done(&commit.thread_ids, false),
            DestructiveKind::Delete => self.overlay.set_deleted(&commit.thread_ids, false),
        }
        true
    }

    /// Undo the active pending commit (the visible undo affordance)
    pub fn undo(&mut self) -> bool {
        match self.scheduler.active().map(|c| c.handle) {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    /// Reclassify a thread. The thread disappears from its origin category
    /// view immediately and appears in the destination only once the
    /// server echoes the move.
    pub fn move_category(&mut self, id: &ThreadId, to: Category, now: Instant) {
        let Some(thread) = self.store.get(id) else {
            return;
        };
        let from = thread.category;
        if from == to {
            return;
        }

        self.overlay.set_category_move(id, from, to);

        // The backend models categories as labels; fire-and-forget
        if let Err(e) = self.coordinator.apply_label(id, &to.label_id()) {
            warn!("category move apply failed for {}: {}", id.as_str(), e);
        }
        if let Err(e) = self.coordinator.remove_label(id, &from.label_id()) {
            warn!("category move remove failed for {}: {}", id.as_str(), e);
        }

        self.notifications.push(
            format!("Moved to {}", to.display_name()),
            vec![id.clone()],
            now,
        );
    }

    /// Optimistically apply a label. On backend failure the delta is
    /// rolled back and the chip enters a transient error state.
    pub fn apply_label(
        &mut self,
        id: &ThreadId,
        label: LabelId,
        now: Instant,
    ) -> Result<(), MutationError> {
        let before = self.overlay.label_delta(id);
        self.overlay.add_label(id, label.clone());

        match self.coordinator.apply_label(id, &label) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.overlay.set_label_delta(id, before);
                self.push_label_error(id.clone(), label, now);
                Err(e)
            }
        }
    }

    /// Optimistically remove a label, with the same rollback contract as
    /// [`MailboxSession::apply_label`]
    pub fn remove_label(
        &mut self,
        id: &ThreadId,
        label: LabelId,
        now: Instant,
    ) -> Result<(), MutationError> {
        let before = self.overlay.label_delta(id);
        self.overlay.remove_label(id, label.clone());

        match self.coordinator.remove_label(id, &label) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.overlay.set_label_delta(id, before);
                self.push_label_error(id.clone(), label, now);
                Err(e)
            }
        }
    }

    fn push_label_error(&mut self, thread_id: ThreadId, label_id: LabelId, now: Instant) {
        self.label_errors.push(LabelError {
            thread_id,
            label_id,
            expires_at: now + self.config.toast_duration(),
        });
    }

    // ========================================================================
    // Selection-consuming bulk actions
    // ========================================================================

    pub fn mark_selected_read(&mut self, read: bool) {
        let ids = self.selection.checked_ids();
        self.set_read_state(&ids, read);
        self.selection.clear();
    }

    pub fn mark_selected_done(&mut self, now: Instant) -> Option<CommitHandle> {
        let ids = self.selection.checked_ids();
        if ids.is_empty() {
            return None;
        }
        self.selection.clear();
        Some(self.mark_done(ids, now))
    }

    pub fn delete_selected(&mut self, now: Instant) -> Option<CommitHandle> {
        let ids = self.selection.checked_ids();
        if ids.is_empty() {
            return None;
        }
        self.selection.clear();
        Some(self.delete(ids, now))
    }

    // ========================================================================
    // Keyboard and timers
    // ========================================================================

    /// Interpret a key press and execute the actions the engine owns.
    /// Intents the host must handle (reply, view navigation) are returned.
    pub fn handle_key(
        &mut self,
        press: KeyPress,
        ctx: &ShortcutContext,
        now: Instant,
    ) -> Option<Action> {
        let action = self
            .shortcuts
            .interpret(press, ctx, self.selection.selection_mode(), now)?;
        self.dispatch(action, now)
    }

    fn dispatch(&mut self, action: Action, now: Instant) -> Option<Action> {
        match action {
            Action::MarkRead => {
                self.mark_selected_read(true);
                None
            }
            Action::MarkUnread => {
                self.mark_selected_read(false);
                None
            }
            Action::MarkDone => {
                self.mark_selected_done(now);
                None
            }
            Action::Delete => {
                self.delete_selected(now);
                None
            }
            Action::SelectAllVisible => {
                self.select_all_visible();
                None
            }
            Action::ClearSelection => {
                self.clear_selection();
                None
            }
            outward @ (Action::Reply | Action::ReplyAll | Action::GoTo(_)) => Some(outward),
        }
    }

    /// Advance all deadlines: drain feed snapshots, fire the due commit,
    /// expire toasts and label errors, resolve chord timeouts. The host
    /// calls this once per frame; returned actions are host intents
    /// (currently only a chord-timeout reply).
    pub fn tick(&mut self, now: Instant) -> Option<Action> {
        let mut snapshots = Vec::new();
        if let Some((_, rx)) = &self.feed {
            while let Ok(snapshot) = rx.try_recv() {
                snapshots.push(snapshot);
            }
        }
        for snapshot in snapshots {
            self.apply_snapshot(snapshot);
        }

        if let Some(due) = self.scheduler.poll_due(now) {
            self.coordinator.commit_destructive(&due);
        }

        self.notifications.expire(now);
        self.label_errors.retain(|e| e.expires_at > now);

        self.shortcuts
            .tick(now)
            .and_then(|action| self.dispatch(action, now))
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) -> bool {
        self.notifications.dismiss(id)
    }

    /// Tear the session down: the pending commit (if any) fires
    /// immediately rather than silently evaporating, and the feed is
    /// unsubscribed.
    pub fn close(&mut self) {
        if let Some(commit) = self.scheduler.flush() {
            self.coordinator.commit_destructive(&commit);
        }
        if let Some((subscription, _)) = self.feed.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RecordedCall, RecordingMutationApi};
    use crate::models::MessageId;

    fn make_session(api: Arc<RecordingMutationApi>) -> MailboxSession {
        MailboxSession::new(ViewFilter::Combined, EngineConfig::default(), api)
    }

    fn make_thread(id: &str, msgs: &[&str]) -> Thread {
        Thread::builder(id)
            .subject("s")
            .message_ids(msgs.iter().map(|m| MessageId::new(*m)).collect())
            .build()
    }

    #[test]
    fn test_key_driven_delete_consumes_selection() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = make_session(api.clone());
        let now = Instant::now();
        session.apply_snapshot(vec![make_thread("t1", &["m1"])]);

        session.toggle_selection(ThreadId::new("t1"));
        let outward = session.handle_key(KeyPress::char('#'), &ShortcutContext::default(), now);
        assert_eq!(outward, None);

        assert!(!session.selection_state().selection_mode);
        assert!(session.display_threads().is_empty());
        assert!(session.active_pending_commit().is_some());
        // Nothing issued until the window elapses
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn test_reply_intents_are_returned_to_host() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = make_session(api);
        let now = Instant::now();

        assert_eq!(
            session.handle_key(KeyPress::char('r'), &ShortcutContext::default(), now),
            None
        );
        let outward = session.handle_key(
            KeyPress::char('a'),
            &ShortcutContext::default(),
            now + std::time::Duration::from_millis(100),
        );
        assert_eq!(outward, Some(Action::ReplyAll));
    }

    #[test]
    fn test_chord_timeout_surfaces_reply_from_tick() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = make_session(api);
        let now = Instant::now();

        session.handle_key(KeyPress::char('r'), &ShortcutContext::default(), now);
        let outward = session.tick(now + std::time::Duration::from_millis(300));
        assert_eq!(outward, Some(Action::Reply));
    }

    #[test]
    fn test_label_failure_records_chip_error() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = make_session(api.clone());
        let now = Instant::now();
        session.apply_snapshot(vec![make_thread("t1", &["m1"])]);

        api.fail_next(MutationError::network("offline"));
        let err = session
            .apply_label(&ThreadId::new("t1"), LabelId::new("L1"), now)
            .unwrap_err();
        assert!(matches!(err, MutationError::Network { .. }));

        assert_eq!(session.label_errors().len(), 1);
        // The error state is transient
        session.tick(now + EngineConfig::default().toast_duration());
        assert!(session.label_errors().is_empty());
    }

    #[test]
    fn test_move_category_issues_label_calls() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = MailboxSession::new(
            ViewFilter::Category(Category::Urgent),
            EngineConfig::default(),
            api.clone(),
        );
        let now = Instant::now();
        session.apply_snapshot(vec![
            Thread::builder("t1")
                .message_ids(vec![MessageId::new("m1")])
                .category(Category::Urgent)
                .build(),
        ]);

        session.move_category(&ThreadId::new("t1"), Category::Others, now);

        assert!(session.display_threads().is_empty());
        let calls = api.calls();
        assert_eq!(
            calls,
            vec![
                RecordedCall::ApplyLabel(ThreadId::new("t1"), LabelId::new("OTHERS")),
                RecordedCall::RemoveLabel(ThreadId::new("t1"), LabelId::new("URGENT")),
            ]
        );
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.notifications()[0].text, "Moved to Others");
    }

    #[test]
    fn test_close_flushes_pending_commit() {
        let api = Arc::new(RecordingMutationApi::new());
        let mut session = make_session(api.clone());
        let now = Instant::now();
        session.apply_snapshot(vec![make_thread("t1", &["m1"])]);

        session.delete(vec![ThreadId::new("t1")], now);
        assert_eq!(api.call_count(), 0);

        session.close();
        assert_eq!(
            api.calls(),
            vec![RecordedCall::Delete(vec![MessageId::new("m1")])]
        );
    }
}
