//! Slash-command suggestions popup, fed by the registry snapshot.
//!
//! Shown while the composer starts with `/`; also doubles as the full
//! selection UI for the bare-`/` sentinel, where the chosen command is
//! dispatched directly.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const MAX_POPUP_ROWS: usize = 8;

pub(crate) struct CommandPopup {
    /// `(name, description)` for every registered command, sorted.
    all_commands: Vec<(String, String)>,
    filter: String,
    selected: usize,
    scroll_top: usize,
}

impl CommandPopup {
    pub(crate) fn new(all_commands: Vec<(String, String)>) -> Self {
        Self {
            all_commands,
            filter: String::new(),
            selected: 0,
            scroll_top: 0,
        }
    }

    /// Update the filter from the composer text. Everything after the
    /// first `/` on the first line, up to the first whitespace, narrows the
    /// list; `/clear something` still filters on `clear`.
    pub(crate) fn on_input_change(&mut self, text: &str) {
        let first_line = text.lines().next().unwrap_or("");
        self.filter = first_line
            .strip_prefix('/')
            .map(|rest| {
                rest.trim_start()
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_string()
            })
            .unwrap_or_default();
        let len = self.filtered().len();
        if len == 0 {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(len - 1);
        }
        self.adjust_scroll();
    }

    pub(crate) fn filtered(&self) -> Vec<&(String, String)> {
        self.all_commands
            .iter()
            .filter(|(name, _)| name.starts_with(&self.filter))
            .collect()
    }

    pub(crate) fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.adjust_scroll();
    }

    pub(crate) fn move_down(&mut self) {
        let len = self.filtered().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
        self.adjust_scroll();
    }

    fn adjust_scroll(&mut self) {
        if self.selected < self.scroll_top {
            self.scroll_top = self.selected;
        } else if self.selected >= self.scroll_top + MAX_POPUP_ROWS {
            self.scroll_top = self.selected + 1 - MAX_POPUP_ROWS;
        }
    }

    /// The currently highlighted command name.
    pub(crate) fn selected_command(&self) -> Option<String> {
        self.filtered()
            .get(self.selected)
            .map(|(name, _)| name.clone())
    }

    pub(crate) fn required_height(&self) -> u16 {
        (self.filtered().len().clamp(1, MAX_POPUP_ROWS) + 2) as u16
    }

    pub(crate) fn render(&self, frame: &mut Frame, area: Rect) {
        let filtered = self.filtered();
        let mut lines: Vec<Line> = Vec::new();
        if filtered.is_empty() {
            lines.push(Line::from(Span::styled(
                "no matching command",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        for (i, (name, description)) in filtered
            .iter()
            .enumerate()
            .skip(self.scroll_top)
            .take(MAX_POPUP_ROWS)
        {
            let style = if i == self.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("/{name:<18}"), style.add_modifier(Modifier::BOLD)),
                Span::styled((*description).clone(), style),
            ]));
        }
        let block = Block::default().borders(Borders::ALL).title("commands");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
