//! Per-thread pending-state record

use serde::{Deserialize, Serialize};

use crate::models::{Category, LabelId};

/// A client-local reclassification pending server confirmation.
///
/// Hides its thread only in the `from` category view; the thread is not
/// injected into the `to` view: it appears there once the server echoes
/// the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMove {
    pub from: Category,
    pub to: Category,
}

/// Optimistic label additions and removals layered over server labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelDelta {
    pub added: Vec<LabelId>,
    pub removed: Vec<LabelId>,
}

impl LabelDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Record an optimistic apply. Last writer wins: a label previously
    /// removed locally is un-removed rather than double-tracked.
    pub fn add(&mut self, label: LabelId) {
        self.removed.retain(|l| l != &label);
        if !self.added.contains(&label) {
            self.added.push(label);
        }
    }

    /// Record an optimistic remove (inverse of [`LabelDelta::add`])
    pub fn remove(&mut self, label: LabelId) {
        self.added.retain(|l| l != &label);
        if !self.removed.contains(&label) {
            self.removed.push(label);
        }
    }

    /// `(server ∪ added) − removed`, preserving server order first
    pub fn apply(&self, server_labels: &[LabelId]) -> Vec<LabelId> {
        let mut labels: Vec<LabelId> = server_labels
            .iter()
            .filter(|l| !self.removed.contains(l))
            .cloned()
            .collect();
        for label in &self.added {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }
}

/// The mutable, client-owned pending state for one thread.
///
/// Every field is independent; an entry with all fields absent/false is
/// logically equivalent to no entry and is evicted by the overlay store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    /// Last-writer-wins read flag; dropped once the server echoes it
    pub read_override: Option<bool>,
    /// Thread hidden from the current view once true
    pub done: bool,
    /// Thread hidden from the current view once true
    pub deleted: bool,
    /// Pending reclassification, scoped to hide only in the origin view
    pub category_move: Option<CategoryMove>,
    /// Optimistic label changes
    pub label_delta: LabelDelta,
}

impl OverlayEntry {
    pub fn is_empty(&self) -> bool {
        self.read_override.is_none()
            && !self.done
            && !self.deleted
            && self.category_move.is_none()
            && self.label_delta.is_empty()
    }
}
