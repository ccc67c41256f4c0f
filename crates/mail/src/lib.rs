//! Mail crate - Optimistic mutation overlay and reconciliation engine
//!
//! This crate keeps a server-synced thread list visually consistent while
//! the user issues rapid optimistic mutations. It provides:
//! - Domain models (Thread, Message, Label, Category)
//! - A read-only thread store fed by a live snapshot stream
//! - The overlay of pending local state and its pure projection
//! - Undo-window scheduling and batched backend commits
//! - Selection, keyboard, and notification coordination
//! - A per-view session facade for the rendering layer
//!
//! This crate has zero UI dependencies. It is executor-agnostic: all
//! time-dependent behavior runs off explicit deadlines the host event
//! loop advances via `MailboxSession::tick`.

pub mod api;
pub mod commit;
pub mod config;
pub mod feed;
pub mod http;
pub mod input;
pub mod models;
pub mod notify;
pub mod overlay;
pub mod selection;
pub mod session;
pub mod store;
pub mod undo;

pub use api::{MutationApi, MutationError, RecordingMutationApi, StaticToken, TokenProvider};
pub use commit::BatchCommitCoordinator;
pub use config::EngineConfig;
pub use feed::{FeedSubscription, InMemoryFeed, ThreadFeed};
pub use http::RestMutationApi;
pub use input::{Action, Key, KeyPress, ShortcutContext, ShortcutInterpreter};
pub use models::{
    AttachmentInfo, Category, EmailAddress, Label, LabelId, Message, MessageId, Thread, ThreadId,
};
pub use notify::{Notification, NotificationDispatcher, NotificationId};
pub use overlay::{CategoryMove, LabelDelta, OverlayEntry, OverlayStore, project};
pub use selection::{SelectionController, SelectionState};
pub use session::{LabelError, MailboxSession};
pub use store::{ThreadStore, ViewFilter};
pub use undo::{CommitHandle, DestructiveKind, PendingCommit, UndoScheduler};
