//! Optimistic mutation overlay
//!
//! Pending local state layered on top of the server-synced thread
//! collection: the entry model, the store mutation handlers write into,
//! the pure projection that merges overlay and snapshot for display, and
//! the reconciliation that evicts server-confirmed state.

mod entry;
mod project;
mod store;

pub use entry::{CategoryMove, LabelDelta, OverlayEntry};
pub use project::project;
pub use store::OverlayStore;
