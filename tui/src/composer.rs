//! Input composer: multi-line accumulation, command history and paste
//! detection. Decoupled from the rendering widget so the logic stays
//! isolated and easy to test.

use std::time::Duration;
use std::time::Instant;

/// Keystrokes arriving closer together than this are treated as a paste.
const PASTE_INTERVAL: Duration = Duration::from_millis(50);

/// Command history is bounded; the oldest entries fall off.
const HISTORY_CAP: usize = 50;

/// What the caller should do after a key was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputAction {
    None,
    /// The operator submitted this text.
    Submit(String),
}

pub(crate) struct Composer {
    /// Text already committed to the widget.
    committed: String,
    /// Fast-arriving characters buffered until a slow keystroke commits
    /// them as a single edit.
    pending: String,
    last_key_at: Option<Instant>,
    /// Number of distinct edits applied to the widget; paste runs count
    /// once.
    commit_count: usize,

    history: Vec<String>,
    /// `None` when not browsing; otherwise an index into `history`.
    history_cursor: Option<usize>,
    /// The in-progress draft saved when browsing starts.
    saved_draft: Option<String>,
}

impl Composer {
    pub(crate) fn new() -> Self {
        Self {
            committed: String::new(),
            pending: String::new(),
            last_key_at: None,
            commit_count: 0,
            history: Vec::new(),
            history_cursor: None,
            saved_draft: None,
        }
    }

    /// The full visible value, pending characters included.
    pub(crate) fn value(&self) -> String {
        let mut value = self.committed.clone();
        value.push_str(&self.pending);
        value
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }

    pub(crate) fn commit_count(&self) -> usize {
        self.commit_count
    }

    /// Handle one printable character at `now`.
    ///
    /// Characters always land in the pending buffer first; a keystroke
    /// arriving after a normal typing gap commits whatever was pending as
    /// one edit and starts a new run. A sub-threshold gap extends the run,
    /// so a paste arrives as a single commit.
    pub(crate) fn insert_char_at(&mut self, c: char, now: Instant) {
        let fast = self
            .last_key_at
            .is_some_and(|last| now.duration_since(last) < PASTE_INTERVAL);
        if !fast {
            self.flush_pending();
        }
        self.pending.push(c);
        self.last_key_at = Some(now);
    }

    /// Bracketed paste: the terminal already batched it for us.
    pub(crate) fn insert_paste(&mut self, text: &str) {
        self.flush_pending();
        self.pending.push_str(text);
        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.committed.push_str(&self.pending);
        self.pending.clear();
        self.commit_count += 1;
    }

    pub(crate) fn backspace(&mut self) {
        self.flush_pending();
        self.committed.pop();
    }

    /// Esc: drop the buffer and leave history browsing.
    pub(crate) fn clear(&mut self) {
        self.committed.clear();
        self.pending.clear();
        self.history_cursor = None;
        self.saved_draft = None;
    }

    /// Enter. A trailing backslash strips it and appends a newline instead
    /// of submitting (multi-line accumulator).
    pub(crate) fn enter(&mut self) -> InputAction {
        self.flush_pending();
        if self.committed.ends_with('\\') {
            self.committed.pop();
            self.committed.push('\n');
            return InputAction::None;
        }
        let text = std::mem::take(&mut self.committed);
        self.history_cursor = None;
        self.saved_draft = None;
        if text.trim().is_empty() {
            return InputAction::None;
        }
        self.push_history(text.clone());
        InputAction::Submit(text)
    }

    fn push_history(&mut self, entry: String) {
        if self.history.last() != Some(&entry) {
            self.history.push(entry);
        }
        if self.history.len() > HISTORY_CAP {
            let overflow = self.history.len() - HISTORY_CAP;
            self.history.drain(..overflow);
        }
    }

    /// Up: walk back through history. The first press saves the current
    /// draft so the final Down restores it.
    pub(crate) fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        self.flush_pending();
        let next = match self.history_cursor {
            None => {
                self.saved_draft = Some(self.committed.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(next);
        self.committed = self.history[next].clone();
    }

    /// Down: walk forward; past the newest entry restores the saved draft.
    pub(crate) fn history_down(&mut self) {
        let Some(cursor) = self.history_cursor else {
            return;
        };
        self.flush_pending();
        if cursor + 1 < self.history.len() {
            self.history_cursor = Some(cursor + 1);
            self.committed = self.history[cursor + 1].clone();
        } else {
            self.history_cursor = None;
            self.committed = self.saved_draft.take().unwrap_or_default();
        }
    }

    pub(crate) fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    fn type_slow(composer: &mut Composer, text: &str, clock: &mut Instant) {
        for c in text.chars() {
            *clock += Duration::from_millis(200);
            composer.insert_char_at(c, *clock);
        }
    }

    #[test]
    fn paste_burst_commits_once() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();

        // 20 runes, 10 ms apart: one paste run.
        for c in "let x = do_something();".chars().take(20) {
            composer.insert_char_at(c, clock);
            clock += Duration::from_millis(10);
        }
        assert_eq!(composer.commit_count(), 0);

        // The next slow keystroke commits the whole run as one edit.
        clock += Duration::from_millis(200);
        composer.insert_char_at('!', clock);
        assert_eq!(composer.commit_count(), 1);
        assert_eq!(composer.value().chars().count(), 21);
    }

    #[test]
    fn slow_typing_commits_per_keystroke() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();
        type_slow(&mut composer, "abc", &mut clock);
        // Each new slow keystroke commits the previous one.
        assert_eq!(composer.commit_count(), 2);
        assert_eq!(composer.value(), "abc");
    }

    #[test]
    fn trailing_backslash_accumulates_lines() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();
        type_slow(&mut composer, "first\\", &mut clock);
        assert_eq!(composer.enter(), InputAction::None);
        type_slow(&mut composer, "second", &mut clock);
        assert_eq!(
            composer.enter(),
            InputAction::Submit("first\nsecond".to_string())
        );
    }

    #[test]
    fn empty_submit_is_ignored() {
        let mut composer = Composer::new();
        assert_eq!(composer.enter(), InputAction::None);
        assert_eq!(composer.history_len(), 0);
    }

    #[test]
    fn history_round_trip_restores_draft() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();

        type_slow(&mut composer, "/help", &mut clock);
        composer.enter();
        type_slow(&mut composer, "/status", &mut clock);
        composer.enter();

        type_slow(&mut composer, "draft", &mut clock);
        composer.history_up();
        assert_eq!(composer.value(), "/status");
        composer.history_up();
        assert_eq!(composer.value(), "/help");
        // Up at the oldest entry stays put.
        composer.history_up();
        assert_eq!(composer.value(), "/help");

        composer.history_down();
        composer.history_down();
        assert_eq!(composer.value(), "draft");
    }

    #[test]
    fn history_is_bounded() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();
        for i in 0..(HISTORY_CAP + 10) {
            type_slow(&mut composer, &format!("cmd {i}"), &mut clock);
            composer.enter();
        }
        assert_eq!(composer.history_len(), HISTORY_CAP);
    }

    #[test]
    fn esc_clears_and_resets_cursor() {
        let mut composer = Composer::new();
        let mut clock = Instant::now();
        type_slow(&mut composer, "/help", &mut clock);
        composer.enter();
        composer.history_up();
        composer.clear();
        assert!(composer.is_empty());
        // Browsing state was reset: Down does nothing.
        composer.history_down();
        assert!(composer.is_empty());
    }

    #[test]
    fn bracketed_paste_is_one_commit() {
        let mut composer = Composer::new();
        composer.insert_paste("whole block of text");
        assert_eq!(composer.commit_count(), 1);
        assert_eq!(composer.value(), "whole block of text");
    }
}
