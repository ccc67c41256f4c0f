//! Pure merge of server snapshot and overlay into display threads

use std::sync::Arc;

use crate::models::Thread;
use crate::store::ViewFilter;

use super::store::OverlayStore;

/// Merge a server snapshot with pending local state.
///
/// Order-preserving and synchronous; safe to call from any trigger because
/// it reads but never writes. Threads with no effective overlay change pass
/// through as clones of the same `Arc`: identity-memoizing consumers must
/// not see a new allocation for a thread that did not change, or the whole
/// list re-renders on every keystroke.
pub fn project(
    server_threads: &[Arc<Thread>],
    overlay: &OverlayStore,
    current_view: &ViewFilter,
) -> Vec<Arc<Thread>> {
    let mut display = Vec::with_capacity(server_threads.len());

    for thread in server_threads {
        let Some(entry) = overlay.entry(&thread.id) else {
            display.push(Arc::clone(thread));
            continue;
        };

        if entry.done || entry.deleted {
            continue;
        }

        // A pending move hides the thread only in its origin category view;
        // it is not locally injected into the destination view.
        if let Some(mv) = entry.category_move
            && current_view.category() == Some(mv.from)
        {
            continue;
        }

        let read = entry.read_override.unwrap_or(thread.is_read);
        let labels = entry.label_delta.apply(&thread.labels);

        if read == thread.is_read && labels == thread.labels {
            // Entry present but inert for this view: keep identity
            display.push(Arc::clone(thread));
            continue;
        }

        let mut merged = (**thread).clone();
        merged.is_read = read;
        merged.labels = labels;
        display.push(Arc::new(merged));
    }

    display
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, LabelId, ThreadId};

    fn make_server_thread(id: &str, is_read: bool, category: Category) -> Arc<Thread> {
        Arc::new(
            Thread::builder(id)
                .subject("s")
                .is_read(is_read)
                .labels(vec![LabelId::new("L1")])
                .category(category)
                .build(),
        )
    }

    fn combined() -> ViewFilter {
        ViewFilter::Combined
    }

    #[test]
    fn test_threads_without_overlay_pass_through_by_identity() {
        let overlay = OverlayStore::new();
        let server = vec![make_server_thread("t1", false, Category::Others)];

        let display = project(&server, &overlay, &combined());
        assert_eq!(display.len(), 1);
        assert!(Arc::ptr_eq(&server[0], &display[0]));
    }

    #[test]
    fn test_done_and_deleted_hide_regardless_of_server_fields() {
        let mut overlay = OverlayStore::new();
        overlay.set_done(&[ThreadId::new("t1")], true);
        overlay.set_deleted(&[ThreadId::new("t2")], true);

        let server = vec![
            make_server_thread("t1", true, Category::Urgent),
            make_server_thread("t2", false, Category::Others),
            make_server_thread("t3", false, Category::Others),
        ];

        let display = project(&server, &overlay, &combined());
        let ids: Vec<&str> = display.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t3"]);
    }

    #[test]
    fn test_read_override_last_writer_wins_in_projection() {
        let mut overlay = OverlayStore::new();
        let id = ThreadId::new("t1");
        let server = vec![make_server_thread("t1", true, Category::Others)];

        overlay.set_read_override(std::slice::from_ref(&id), false);
        overlay.set_read_override(std::slice::from_ref(&id), true);
        let display = project(&server, &overlay, &combined());
        assert!(display[0].is_read);

        overlay.set_read_override(std::slice::from_ref(&id), true);
        overlay.set_read_override(std::slice::from_ref(&id), false);
        let display = project(&server, &overlay, &combined());
        assert!(!display[0].is_read);
    }

    #[test]
    fn test_category_move_hides_only_in_origin_view() {
        let mut overlay = OverlayStore::new();
        overlay.set_category_move(&ThreadId::new("t1"), Category::Urgent, Category::Others);

        let server = vec![make_server_thread("t1", false, Category::Urgent)];

        let urgent = ViewFilter::Category(Category::Urgent);
        assert!(project(&server, &overlay, &urgent).is_empty());

        // Under any other view the entry is inert; identity is kept
        let others = ViewFilter::Category(Category::Others);
        let display = project(&server, &overlay, &others);
        assert_eq!(display.len(), 1);
        assert!(Arc::ptr_eq(&server[0], &display[0]));

        let display = project(&server, &overlay, &combined());
        assert_eq!(display.len(), 1);
        assert!(Arc::ptr_eq(&server[0], &display[0]));
    }

    #[test]
    fn test_label_delta_merged_into_display() {
        let mut overlay = OverlayStore::new();
        let id = ThreadId::new("t1");
        overlay.add_label(&id, LabelId::new("L2"));
        overlay.remove_label(&id, LabelId::new("L1"));

        let server = vec![make_server_thread("t1", false, Category::Others)];
        let display = project(&server, &overlay, &combined());

        assert_eq!(display[0].labels, vec![LabelId::new("L2")]);
        assert!(!Arc::ptr_eq(&server[0], &display[0]));
    }

    #[test]
    fn test_inert_delta_keeps_identity() {
        let mut overlay = OverlayStore::new();
        let id = ThreadId::new("t1");
        // Adding a label the server already has changes nothing visible
        overlay.add_label(&id, LabelId::new("L1"));

        let server = vec![make_server_thread("t1", false, Category::Others)];
        let display = project(&server, &overlay, &combined());
        assert!(Arc::ptr_eq(&server[0], &display[0]));
    }

    #[test]
    fn test_order_preserved() {
        let mut overlay = OverlayStore::new();
        overlay.set_done(&[ThreadId::new("t2")], true);

        let server = vec![
            make_server_thread("t1", false, Category::Others),
            make_server_thread("t2", false, Category::Others),
            make_server_thread("t3", false, Category::Others),
            make_server_thread("t4", false, Category::Others),
        ];

        let display = project(&server, &overlay, &combined());
        let ids: Vec<&str> = display.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3", "t4"]);
    }
}
