//! Bounded log ring with stick-to-bottom scrolling.

use std::collections::VecDeque;

/// Hard cap on retained log lines.
const LOG_CAP: usize = 500;

pub(crate) struct LogPane {
    lines: VecDeque<String>,
    /// Index of the first visible line.
    scroll: usize,
    /// Follow new output while the viewport is at the bottom.
    stick_to_bottom: bool,
    pub(crate) collapsed: bool,
}

impl LogPane {
    pub(crate) fn new(collapsed: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            scroll: 0,
            stick_to_bottom: true,
            collapsed,
        }
    }

    /// Append a possibly multi-line block. Scrolls to the bottom iff the
    /// viewport already was at the bottom.
    pub(crate) fn push(&mut self, text: &str) {
        for line in text.lines() {
            if self.lines.len() == LOG_CAP {
                self.lines.pop_front();
                self.scroll = self.scroll.saturating_sub(1);
            }
            self.lines.push_back(line.to_string());
        }
    }

    /// Append streamed output to the last line, starting a new line on
    /// embedded newlines.
    pub(crate) fn push_stream_delta(&mut self, delta: &str) {
        let mut rest = delta;
        while let Some(newline_at) = rest.find('\n') {
            let (head, tail) = rest.split_at(newline_at);
            self.append_to_last(head);
            self.push("");
            rest = &tail[1..];
        }
        self.append_to_last(rest);
    }

    fn append_to_last(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.lines.back_mut() {
            Some(last) => last.push_str(text),
            None => self.push(text),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines visible in a viewport of `height` rows.
    pub(crate) fn visible(&self, height: usize) -> Vec<&str> {
        let start = if self.stick_to_bottom {
            self.lines.len().saturating_sub(height)
        } else {
            self.scroll.min(self.lines.len().saturating_sub(1))
        };
        self.lines
            .iter()
            .skip(start)
            .take(height)
            .map(String::as_str)
            .collect()
    }

    pub(crate) fn scroll_up(&mut self, height: usize) {
        let current = if self.stick_to_bottom {
            self.lines.len().saturating_sub(height)
        } else {
            self.scroll
        };
        self.scroll = current.saturating_sub(1);
        self.stick_to_bottom = false;
    }

    pub(crate) fn scroll_down(&mut self, height: usize) {
        if self.stick_to_bottom {
            return;
        }
        self.scroll += 1;
        if self.scroll + height >= self.lines.len() {
            self.stick_to_bottom = true;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ring_is_bounded_at_cap() {
        let mut pane = LogPane::new(false);
        for i in 0..(LOG_CAP + 25) {
            pane.push(&format!("line {i}"));
        }
        assert_eq!(pane.len(), LOG_CAP);
        assert_eq!(pane.visible(1), vec![format!("line {}", LOG_CAP + 24)]);
    }

    #[test]
    fn sticks_to_bottom_only_when_at_bottom() {
        let mut pane = LogPane::new(false);
        for i in 0..20 {
            pane.push(&format!("line {i}"));
        }
        assert_eq!(pane.visible(5).first().copied(), Some("line 15"));

        pane.scroll_up(5);
        let pinned = pane.visible(5).first().copied().map(str::to_string);
        pane.push("new line");
        assert_eq!(pane.visible(5).first().copied().map(str::to_string), pinned);

        // Scrolling back to the bottom re-enables following.
        for _ in 0..30 {
            pane.scroll_down(5);
        }
        pane.push("newest");
        assert_eq!(pane.visible(5).last().copied(), Some("newest"));
    }

    #[test]
    fn stream_deltas_extend_the_last_line() {
        let mut pane = LogPane::new(false);
        pane.push("prompt:");
        pane.push_stream_delta("hel");
        pane.push_stream_delta("lo\nworld");
        assert_eq!(pane.visible(10), vec!["prompt:hello", "world"]);
    }
}
