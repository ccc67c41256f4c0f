//! Keyboard contract for the thread list
//!
//! Keys are interpreted, never acted on, here: the host feeds key presses
//! plus explicit guard state (input focus, modal open) and receives intents
//! back. Guards are evaluated before any key is looked at: suppression is
//! not a side effect of focus handling elsewhere. Two-key sequences (R A
//! for reply-all, G-prefixed view navigation) run through an explicit
//! awaiting-second-key state with a deadline instead of ad hoc timer refs.

use std::time::{Duration, Instant};

use crate::models::Category;
use crate::store::ViewFilter;

/// A key press as delivered by the host platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    /// Platform "select all" modifier (Ctrl or Cmd)
    pub platform_modifier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

impl KeyPress {
    pub fn char(c: char) -> Self {
        Self {
            key: Key::Char(c),
            platform_modifier: false,
        }
    }

    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            platform_modifier: false,
        }
    }

    pub fn with_platform_modifier(c: char) -> Self {
        Self {
            key: Key::Char(c),
            platform_modifier: true,
        }
    }
}

/// Guard state the host must supply with every key press
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutContext {
    /// Any text-input or rich-text-editing surface has focus
    pub input_focused: bool,
    /// Any modal overlay (compose/reply/forward) is open
    pub modal_open: bool,
}

impl ShortcutContext {
    fn suppressed(&self) -> bool {
        self.input_focused || self.modal_open
    }
}

/// An intent produced from a key press, to be executed by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MarkRead,
    MarkUnread,
    MarkDone,
    Delete,
    SelectAllVisible,
    ClearSelection,
    Reply,
    ReplyAll,
    GoTo(ViewFilter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChordPrefix {
    Reply,
    GoTo,
}

struct PendingChord {
    prefix: ChordPrefix,
    deadline: Instant,
}

/// Interprets key presses into [`Action`]s.
///
/// Single-letter action shortcuts are active only while the selection is
/// non-empty. Chord prefixes hold an awaiting-second-key state until the
/// deadline; `tick` resolves an expired Reply prefix to its standalone
/// meaning.
pub struct ShortcutInterpreter {
    chord_timeout: Duration,
    pending: Option<PendingChord>,
}

impl ShortcutInterpreter {
    pub fn new(chord_timeout: Duration) -> Self {
        Self {
            chord_timeout,
            pending: None,
        }
    }

    /// Whether a chord prefix is waiting for its second key
    pub fn awaiting_second_key(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve an expired chord. `R` alone means plain reply; an expired
    /// `G` prefix means nothing.
    pub fn tick(&mut self, now: Instant) -> Option<Action> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            let expired = self.pending.take().unwrap();
            return match expired.prefix {
                ChordPrefix::Reply => Some(Action::Reply),
                ChordPrefix::GoTo => None,
            };
        }
        None
    }

    /// Interpret one key press under the given guards
    pub fn interpret(
        &mut self,
        press: KeyPress,
        ctx: &ShortcutContext,
        selection_active: bool,
        now: Instant,
    ) -> Option<Action> {
        if ctx.suppressed() {
            // Typing must never half-complete a chord behind the guard
            self.pending = None;
            return None;
        }

        // An expired prefix no longer participates; tick() already had (or
        // will have) its chance to emit the standalone meaning
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            self.pending = None;
        }

        if let Some(pending) = self.pending.take() {
            if let Some(action) = Self::complete_chord(pending.prefix, press) {
                return Some(action);
            }
            // Not a continuation: the second key is interpreted alone
        }

        match press.key {
            Key::Escape => Some(Action::ClearSelection),
            Key::Char(c) if press.platform_modifier => match c {
                'a' => Some(Action::SelectAllVisible),
                _ => None,
            },
            Key::Char('g') => {
                self.pending = Some(PendingChord {
                    prefix: ChordPrefix::GoTo,
                    deadline: now + self.chord_timeout,
                });
                None
            }
            Key::Char('r') if !selection_active => {
                self.pending = Some(PendingChord {
                    prefix: ChordPrefix::Reply,
                    deadline: now + self.chord_timeout,
                });
                None
            }
            Key::Char(c) if selection_active => match c {
                'r' => Some(Action::MarkRead),
                'u' => Some(Action::MarkUnread),
                'e' => Some(Action::MarkDone),
                '#' => Some(Action::Delete),
                _ => None,
            },
            _ => None,
        }
    }

    fn complete_chord(prefix: ChordPrefix, press: KeyPress) -> Option<Action> {
        let Key::Char(c) = press.key else {
            return None;
        };
        if press.platform_modifier {
            return None;
        }

        match prefix {
            ChordPrefix::Reply => match c {
                'a' => Some(Action::ReplyAll),
                _ => None,
            },
            ChordPrefix::GoTo => match c {
                'u' => Some(Action::GoTo(ViewFilter::Category(Category::Urgent))),
                'i' => Some(Action::GoTo(ViewFilter::Category(Category::Important))),
                'p' => Some(Action::GoTo(ViewFilter::Category(Category::Promises))),
                'a' => Some(Action::GoTo(ViewFilter::Category(Category::Awaiting))),
                'o' => Some(Action::GoTo(ViewFilter::Category(Category::Others))),
                'c' => Some(Action::GoTo(ViewFilter::Combined)),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(300);

    fn interpreter() -> ShortcutInterpreter {
        ShortcutInterpreter::new(TIMEOUT)
    }

    fn quiet() -> ShortcutContext {
        ShortcutContext::default()
    }

    #[test]
    fn test_action_keys_require_selection() {
        let mut keys = interpreter();
        let now = Instant::now();

        assert_eq!(keys.interpret(KeyPress::char('e'), &quiet(), false, now), None);
        assert_eq!(
            keys.interpret(KeyPress::char('e'), &quiet(), true, now),
            Some(Action::MarkDone)
        );
        assert_eq!(
            keys.interpret(KeyPress::char('#'), &quiet(), true, now),
            Some(Action::Delete)
        );
        assert_eq!(
            keys.interpret(KeyPress::char('u'), &quiet(), true, now),
            Some(Action::MarkUnread)
        );
    }

    #[test]
    fn test_guards_suppress_everything() {
        let mut keys = interpreter();
        let now = Instant::now();

        let typing = ShortcutContext {
            input_focused: true,
            modal_open: false,
        };
        assert_eq!(keys.interpret(KeyPress::char('#'), &typing, true, now), None);

        let modal = ShortcutContext {
            input_focused: false,
            modal_open: true,
        };
        assert_eq!(keys.interpret(KeyPress::char('#'), &modal, true, now), None);
    }

    #[test]
    fn test_guard_aborts_pending_chord() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('r'), &quiet(), false, now);
        assert!(keys.awaiting_second_key());

        let modal = ShortcutContext {
            input_focused: false,
            modal_open: true,
        };
        keys.interpret(KeyPress::char('a'), &modal, false, now);
        assert!(!keys.awaiting_second_key());
    }

    #[test]
    fn test_reply_all_chord() {
        let mut keys = interpreter();
        let now = Instant::now();

        assert_eq!(keys.interpret(KeyPress::char('r'), &quiet(), false, now), None);
        assert!(keys.awaiting_second_key());

        let action = keys.interpret(
            KeyPress::char('a'),
            &quiet(),
            false,
            now + Duration::from_millis(200),
        );
        assert_eq!(action, Some(Action::ReplyAll));
        assert!(!keys.awaiting_second_key());
    }

    #[test]
    fn test_reply_chord_timeout_means_plain_reply() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('r'), &quiet(), false, now);
        assert_eq!(keys.tick(now + Duration::from_millis(299)), None);
        assert_eq!(keys.tick(now + TIMEOUT), Some(Action::Reply));
        assert_eq!(keys.tick(now + TIMEOUT), None);
    }

    #[test]
    fn test_late_second_key_is_interpreted_alone() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('r'), &quiet(), false, now);
        // Deadline passed without a tick; 'a' no longer completes the chord
        let action = keys.interpret(KeyPress::char('a'), &quiet(), false, now + TIMEOUT);
        assert_eq!(action, None);
        assert!(!keys.awaiting_second_key());
    }

    #[test]
    fn test_non_continuation_aborts_and_reinterprets() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('g'), &quiet(), true, now);
        // '#' is not a G continuation; with a selection it means delete
        let action = keys.interpret(
            KeyPress::char('#'),
            &quiet(),
            true,
            now + Duration::from_millis(100),
        );
        assert_eq!(action, Some(Action::Delete));
    }

    #[test]
    fn test_goto_chords() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('g'), &quiet(), false, now);
        let action = keys.interpret(
            KeyPress::char('u'),
            &quiet(),
            false,
            now + Duration::from_millis(100),
        );
        assert_eq!(
            action,
            Some(Action::GoTo(ViewFilter::Category(Category::Urgent)))
        );

        keys.interpret(KeyPress::char('g'), &quiet(), false, now);
        let action = keys.interpret(
            KeyPress::char('c'),
            &quiet(),
            false,
            now + Duration::from_millis(100),
        );
        assert_eq!(action, Some(Action::GoTo(ViewFilter::Combined)));
    }

    #[test]
    fn test_goto_timeout_emits_nothing() {
        let mut keys = interpreter();
        let now = Instant::now();

        keys.interpret(KeyPress::char('g'), &quiet(), false, now);
        assert_eq!(keys.tick(now + TIMEOUT), None);
        assert!(!keys.awaiting_second_key());
    }

    #[test]
    fn test_platform_select_all() {
        let mut keys = interpreter();
        let now = Instant::now();

        assert_eq!(
            keys.interpret(KeyPress::with_platform_modifier('a'), &quiet(), false, now),
            Some(Action::SelectAllVisible)
        );
    }

    #[test]
    fn test_escape_clears_selection() {
        let mut keys = interpreter();
        let now = Instant::now();

        assert_eq!(
            keys.interpret(KeyPress::escape(), &quiet(), true, now),
            Some(Action::ClearSelection)
        );
    }

    #[test]
    fn test_r_with_selection_marks_read_not_chord() {
        let mut keys = interpreter();
        let now = Instant::now();

        let action = keys.interpret(KeyPress::char('r'), &quiet(), true, now);
        assert_eq!(action, Some(Action::MarkRead));
        assert!(!keys.awaiting_second_key());
    }
}
