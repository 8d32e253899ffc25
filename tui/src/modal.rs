//! Modal prompt overlay.
//!
//! While a prompt is active every keystroke is consumed here; the rest of
//! the TUI keeps rendering and the agent worker keeps running, blocked only
//! on the answer channel.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;

use ledit_protocol::PromptAnswer;
use ledit_protocol::PromptRequest;

pub(crate) struct ActiveModal {
    pub(crate) request: PromptRequest,
    /// Accumulated text for the free-text variant.
    input: String,
}

impl ActiveModal {
    pub(crate) fn new(request: PromptRequest) -> Self {
        Self {
            request,
            input: String::new(),
        }
    }

    /// Feed one key. `Some(answer)` ends the modal.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Option<PromptAnswer> {
        if self.request.yes_no {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    Some(PromptAnswer::YesNo { value: true })
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    Some(PromptAnswer::YesNo { value: false })
                }
                // Enter and Esc both submit the default.
                KeyCode::Enter | KeyCode::Esc => Some(PromptAnswer::YesNo {
                    value: self.request.default_yes,
                }),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Enter => Some(PromptAnswer::Text {
                value: std::mem::take(&mut self.input),
            }),
            KeyCode::Esc => Some(PromptAnswer::Cancelled),
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(8).clamp(20, 80);
        let context_lines = self.request.context.lines().count() as u16;
        let height = (context_lines + 5).clamp(5, area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let rect = Rect::new(x, y, width, height);

        let hint = if self.request.yes_no {
            if self.request.default_yes {
                "[Y/n]"
            } else {
                "[y/N]"
            }
        } else {
            "(type, Enter to submit, Esc to cancel)"
        };

        let mut lines: Vec<Line> = Vec::new();
        if !self.request.context.is_empty() {
            for line in self.request.context.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            Span::styled(
                self.request.prompt.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(hint, Style::default().add_modifier(Modifier::DIM)),
        ]));
        if !self.request.yes_no {
            lines.push(Line::from(format!("> {}", self.input)));
        }

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("input needed")),
            rect,
        );
    }
}
