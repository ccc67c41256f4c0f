//! Engine tuning knobs
//!
//! The undo window is configured per mutation kind: delete (from a list
//! row or batch selection) commits after 3 s, mark-done in the combined
//! inbox after 5 s. The two differ on purpose and neither is a hard-coded
//! constant at the call site.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::undo::DestructiveKind;

/// Filename under the Meridian config directory
const CONFIG_FILE: &str = "engine.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo window for delete actions, in milliseconds
    pub delete_undo_window_ms: u64,
    /// Undo window for mark-done actions, in milliseconds
    pub done_undo_window_ms: u64,
    /// How long a toast stays visible, in milliseconds
    pub toast_duration_ms: u64,
    /// Deadline for the second key of a two-key shortcut, in milliseconds
    pub chord_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delete_undo_window_ms: 3000,
            done_undo_window_ms: 5000,
            toast_duration_ms: 3000,
            chord_timeout_ms: 300,
        }
    }
}

impl EngineConfig {
    /// Load from ~/.config/meridian/engine.json, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        config::load_json_or_default(CONFIG_FILE)
    }

    /// The undo window for a destructive mutation kind
    pub fn undo_window(&self, kind: DestructiveKind) -> Duration {
        match kind {
            DestructiveKind::Delete => Duration::from_millis(self.delete_undo_window_ms),
            DestructiveKind::Done => Duration::from_millis(self.done_undo_window_ms),
        }
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }
}
