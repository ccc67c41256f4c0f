//! Thread model representing a server-grouped conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LabelId, MessageId};

/// Unique identifier for a thread (server thread ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-derived inbox category for a thread.
///
/// Categorization happens server-side; the client only ever reclassifies
/// optimistically via an overlay entry and waits for the server to echo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Urgent,
    Important,
    Promises,
    Awaiting,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Urgent => "URGENT",
            Category::Important => "IMPORTANT",
            Category::Promises => "PROMISES",
            Category::Awaiting => "AWAITING",
            Category::Others => "OTHERS",
        }
    }

    /// The label id the backend uses to represent this category
    pub fn label_id(&self) -> LabelId {
        LabelId::new(self.as_str())
    }

    /// Human-readable name for notifications ("moved to Important")
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Urgent => "Urgent",
            Category::Important => "Important",
            Category::Promises => "Promises",
            Category::Awaiting => "Awaiting",
            Category::Others => "Others",
        }
    }
}

/// A thread represents a conversation shown as one list row.
///
/// Threads are owned by the server: the client never constructs one outside
/// of snapshot ingestion, only displays them (possibly through the overlay).
/// `PartialEq` is derived so the store can keep the previous allocation for
/// threads a new snapshot did not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// Server thread ID
    pub id: ThreadId,
    /// Subject line of the thread
    pub subject: String,
    /// Preview text of the latest message
    pub snippet: String,
    /// Member message IDs, in conversation order
    pub message_ids: Vec<MessageId>,
    /// Whether every message in the thread has been read
    pub is_read: bool,
    /// Label IDs attached to the thread
    pub labels: Vec<LabelId>,
    /// Timestamp of the most recent activity in the thread
    pub last_activity: DateTime<Utc>,
    /// Server-derived inbox category
    pub category: Category,
    /// Display name of the thread sender (from the first message)
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Email address of the thread sender
    #[serde(default)]
    pub sender_email: String,
}

impl Thread {
    /// Create a new thread builder
    pub fn builder(id: impl Into<ThreadId>) -> ThreadBuilder {
        ThreadBuilder::new(id.into())
    }

    /// Whether the thread carries the given label
    pub fn has_label(&self, label: &LabelId) -> bool {
        self.labels.contains(label)
    }
}

/// Builder for thread snapshots (used by feed adapters and tests)
pub struct ThreadBuilder {
    id: ThreadId,
    subject: String,
    snippet: String,
    message_ids: Vec<MessageId>,
    is_read: bool,
    labels: Vec<LabelId>,
    last_activity: Option<DateTime<Utc>>,
    category: Category,
    sender_name: Option<String>,
    sender_email: String,
}

impl ThreadBuilder {
    fn new(id: ThreadId) -> Self {
        Self {
            id,
            subject: String::new(),
            snippet: String::new(),
            message_ids: Vec::new(),
            is_read: false,
            labels: Vec::new(),
            last_activity: None,
            category: Category::Others,
            sender_name: None,
            sender_email: String::new(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn message_ids(mut self, ids: Vec<MessageId>) -> Self {
        self.message_ids = ids;
        self
    }

    pub fn is_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    pub fn labels(mut self, labels: Vec<LabelId>) -> Self {
        self.labels = labels;
        self
    }

    pub fn last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity = Some(at);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn sender_email(mut self, email: impl Into<String>) -> Self {
        self.sender_email = email.into();
        self
    }

    pub fn build(self) -> Thread {
        Thread {
            id: self.id,
            subject: self.subject,
            snippet: self.snippet,
            message_ids: self.message_ids,
            is_read: self.is_read,
            labels: self.labels,
            last_activity: self.last_activity.unwrap_or_else(Utc::now),
            category: self.category,
            sender_name: self.sender_name,
            sender_email: self.sender_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_wire_format() {
        let json = serde_json::to_string(&Category::Urgent).unwrap();
        assert_eq!(json, "\"URGENT\"");

        let back: Category = serde_json::from_str("\"AWAITING\"").unwrap();
        assert_eq!(back, Category::Awaiting);
    }

    #[test]
    fn test_category_label_id() {
        assert_eq!(Category::Promises.label_id().as_str(), "PROMISES");
    }

    #[test]
    fn test_thread_builder_defaults() {
        let thread = Thread::builder("t1").subject("Hello").build();
        assert_eq!(thread.id.as_str(), "t1");
        assert_eq!(thread.category, Category::Others);
        assert!(!thread.is_read);
        assert!(thread.message_ids.is_empty());
    }

    #[test]
    fn test_thread_equality_detects_field_changes() {
        let a = Thread::builder("t1")
            .subject("Hello")
            .last_activity(chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap())
            .build();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.is_read = true;
        assert_ne!(a, b);
    }
}
