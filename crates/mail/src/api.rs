//! Consumed backend interfaces and the mutation error taxonomy
//!
//! The engine never talks to a concrete backend directly: mutations go
//! through [`MutationApi`], credentials through [`TokenProvider`]. The
//! shipped HTTP transport lives in [`crate::http`]; a recording stub for
//! tests lives here, next to the traits it fakes.

use std::sync::Mutex;

use crate::models::{LabelId, MessageId, ThreadId};

/// Errors surfaced by mutation calls.
///
/// The overlay layer decides what to do with these: read/unread/done/delete
/// failures are logged and swallowed (accepted drift until the next full
/// resync), label failures trigger a rollback of the optimistic delta.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MutationError {
    /// The call failed after the mutation was already optimistically applied
    #[error("network error: {message}")]
    Network { message: String },

    /// Malformed identifier; should not occur given internal sourcing
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Expired or invalid bearer credential
    #[error("authentication required")]
    AuthRequired,
}

impl MutationError {
    pub fn network(message: impl Into<String>) -> Self {
        MutationError::Network {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MutationError::Validation {
            message: message.into(),
        }
    }
}

/// Batched mutation calls against the backend.
///
/// Read/unread/done/delete operate on message identifiers (one batched call
/// per mutation kind); label calls are single-item and keyed by thread.
/// Implementations are expected not to block the caller for long; the
/// engine issues calls after the overlay is already updated and only ever
/// inspects the result for logging or label rollback.
pub trait MutationApi: Send + Sync {
    fn mark_read(&self, message_ids: &[MessageId]) -> Result<(), MutationError>;
    fn mark_unread(&self, message_ids: &[MessageId]) -> Result<(), MutationError>;
    fn mark_done(&self, message_ids: &[MessageId]) -> Result<(), MutationError>;
    fn delete(&self, message_ids: &[MessageId]) -> Result<(), MutationError>;
    fn apply_label(&self, thread_id: &ThreadId, label_id: &LabelId)
    -> Result<(), MutationError>;
    fn remove_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError>;
}

/// Supplies the bearer credential consumed by network transports
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, MutationError>;
}

/// A token provider holding a fixed credential (tests, short-lived tools)
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Result<String, MutationError> {
        Ok(self.0.clone())
    }
}

/// One recorded backend call, in issue order
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    MarkRead(Vec<MessageId>),
    MarkUnread(Vec<MessageId>),
    MarkDone(Vec<MessageId>),
    Delete(Vec<MessageId>),
    ApplyLabel(ThreadId, LabelId),
    RemoveLabel(ThreadId, LabelId),
}

/// In-memory [`MutationApi`] that records every call.
///
/// Used for testing and as a stub before a real transport is configured.
/// `fail_next` scripts a failure for the next call, after which the stub
/// succeeds again.
#[derive(Default)]
pub struct RecordingMutationApi {
    calls: Mutex<Vec<RecordedCall>>,
    fail_next: Mutex<Option<MutationError>>,
}

impl RecordingMutationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next call to fail with the given error
    pub fn fail_next(&self, err: MutationError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// All calls recorded so far, in issue order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls recorded so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: RecordedCall) -> Result<(), MutationError> {
        let scripted = self.fail_next.lock().unwrap().take();
        self.calls.lock().unwrap().push(call);
        match scripted {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl MutationApi for RecordingMutationApi {
    fn mark_read(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.record(RecordedCall::MarkRead(message_ids.to_vec()))
    }

    fn mark_unread(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.record(RecordedCall::MarkUnread(message_ids.to_vec()))
    }

    fn mark_done(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.record(RecordedCall::MarkDone(message_ids.to_vec()))
    }

    fn delete(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.record(RecordedCall::Delete(message_ids.to_vec()))
    }

    fn apply_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.record(RecordedCall::ApplyLabel(thread_id.clone(), label_id.clone()))
    }

    fn remove_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.record(RecordedCall::RemoveLabel(thread_id.clone(), label_id.clone()))
    }
}
