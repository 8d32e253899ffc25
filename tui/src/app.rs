//! The TUI event loop.
//!
//! Single-threaded cooperative: one `tokio::select!`-driven loop consumes
//! keyboard input and agent events from a single multiplexed channel,
//! renders after every event, and never blocks anywhere else. The agent
//! worker runs on its own task and is reached only through the submission
//! channel and the [`UiBridge`] prompt correlation map.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::Event as CtEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;
use unicode_width::UnicodeWidthStr;

use ledit_core::agent::Agent;
use ledit_core::agent::UiBridge;
use ledit_core::client::ModelClient;
use ledit_core::commands::register_builtins;
use ledit_core::config::Config;
use ledit_core::registry;
use ledit_protocol::AgentEvent;
use ledit_protocol::ProgressSnapshot;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::command_popup::CommandPopup;
use crate::composer::Composer;
use crate::composer::InputAction;
use crate::file_refs::append_file_references;
use crate::log_pane::LogPane;
use crate::modal::ActiveModal;

pub struct App {
    config: Config,
    ui: Arc<UiBridge>,
    submissions: UnboundedSender<String>,
    /// `(name, description)` snapshot of the registry for the popup.
    command_snapshot: Vec<(String, String)>,

    composer: Composer,
    logs: LogPane,
    popup: Option<CommandPopup>,
    /// Bare-`/` selection mode: Enter dispatches the highlighted command.
    selecting_command: bool,
    modal: Option<ActiveModal>,
    progress: ProgressSnapshot,
    status: String,
    header: String,
    streaming: bool,
    done: bool,
}

impl App {
    fn new(
        config: Config,
        ui: Arc<UiBridge>,
        submissions: UnboundedSender<String>,
        command_snapshot: Vec<(String, String)>,
    ) -> Self {
        let logs_collapsed = config.logs_collapsed;
        let header = format!("ledit — {}/{}", config.provider, config.model);
        Self {
            config,
            ui,
            submissions,
            command_snapshot,
            composer: Composer::new(),
            logs: LogPane::new(logs_collapsed),
            popup: None,
            selecting_command: false,
            modal: None,
            progress: ProgressSnapshot::default(),
            status: String::new(),
            header,
            streaming: false,
            done: false,
        }
    }

    /// Apply one event to the state. Rendering happens afterwards in the
    /// loop; this function never touches the terminal.
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Agent(event) => self.handle_agent_event(event),
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Paste(text) => {
                self.composer.insert_paste(&text);
                self.refresh_popup();
            }
            AppEvent::Resize(_, _) => {}
        }
    }

    fn handle_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Log { text } => self.logs.push(&text),
            AgentEvent::Status { text } => self.status = text,
            AgentEvent::Progress { snapshot } => self.progress = snapshot,
            AgentEvent::ModelInfo { provider, model } => {
                self.header = format!("ledit — {provider}/{model}");
            }
            AgentEvent::StreamStart => {
                self.streaming = true;
                self.logs.push("");
            }
            AgentEvent::StreamDelta { text } => self.logs.push_stream_delta(&text),
            AgentEvent::StreamEnd => self.streaming = false,
            AgentEvent::Prompt { request } => self.modal = Some(ActiveModal::new(request)),
            AgentEvent::Shutdown => self.done = true,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        // Ctrl+C always quits, modal or not.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.done = true;
            return;
        }

        // While a modal is up it owns the keyboard; everything else is
        // swallowed.
        if let Some(modal) = self.modal.as_mut() {
            if let Some(answer) = modal.handle_key(key) {
                let id = modal.request.id;
                self.modal = None;
                self.ui.resolve(id, answer);
            }
            return;
        }

        match key.code {
            KeyCode::Enter => {
                if self.selecting_command {
                    if let Some(name) = self.popup.as_ref().and_then(CommandPopup::selected_command)
                    {
                        self.close_popup();
                        self.composer.clear();
                        self.submit_line(format!("/{name}"));
                    }
                    return;
                }
                match self.composer.enter() {
                    InputAction::Submit(text) => {
                        self.close_popup();
                        self.submit_line(text);
                    }
                    InputAction::None => self.refresh_popup(),
                }
            }
            KeyCode::Up => match self.popup.as_mut() {
                Some(popup) => popup.move_up(),
                None => self.composer.history_up(),
            },
            KeyCode::Down => match self.popup.as_mut() {
                Some(popup) => popup.move_down(),
                None => self.composer.history_down(),
            },
            KeyCode::Esc => {
                self.composer.clear();
                self.close_popup();
            }
            KeyCode::PageUp => self.logs.scroll_up(10),
            KeyCode::PageDown => self.logs.scroll_down(10),
            // Reserved for autocomplete; the widget ignores it for now.
            KeyCode::Tab => {}
            KeyCode::Backspace => {
                self.composer.backspace();
                self.refresh_popup();
            }
            KeyCode::Char(c) => {
                self.composer.insert_char_at(c, Instant::now());
                self.refresh_popup();
            }
            _ => {}
        }
    }

    /// Route a submitted line: bare `/` opens the selection popup, command
    /// lines go to the dispatcher, free text gets file references appended
    /// and goes to the agent worker.
    fn submit_line(&mut self, text: String) {
        let trimmed = text.trim();
        if trimmed == "/" {
            let mut popup = CommandPopup::new(self.command_snapshot.clone());
            popup.on_input_change("/");
            self.popup = Some(popup);
            self.selecting_command = true;
            return;
        }

        let outgoing = if registry::is_command(trimmed) && !trimmed.contains('\n') {
            text
        } else {
            append_file_references(&text, &self.config.cwd)
        };
        let _ = self.submissions.send(outgoing);
    }

    fn refresh_popup(&mut self) {
        if self.selecting_command {
            return;
        }
        let value = self.composer.value();
        let is_slash = value.starts_with('/') && !value.contains('\n');
        match (is_slash, self.popup.as_mut()) {
            (true, Some(popup)) => popup.on_input_change(&value),
            (true, None) => {
                let mut popup = CommandPopup::new(self.command_snapshot.clone());
                popup.on_input_change(&value);
                self.popup = Some(popup);
            }
            (false, _) => self.popup = None,
        }
    }

    fn close_popup(&mut self) {
        self.popup = None;
        self.selecting_command = false;
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let logs_height = if self.logs.collapsed {
            3
        } else {
            area.height.saturating_sub(7)
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(logs_height),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                self.header.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ))),
            chunks[0],
        );

        let progress = format!(
            "tokens {total} (prompt {prompt} / completion {completion})  cost ${cost:.4}  ctx {ctx}%{streaming}",
            total = self.progress.total_tokens,
            prompt = self.progress.prompt_tokens,
            completion = self.progress.completion_tokens,
            cost = self.progress.cost_usd,
            ctx = self.progress.context_percent,
            streaming = if self.streaming { "  ⋯ streaming" } else { "" },
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                progress,
                Style::default().add_modifier(Modifier::DIM),
            ))),
            chunks[1],
        );

        let log_area = chunks[2];
        let inner_height = log_area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .logs
            .visible(inner_height)
            .into_iter()
            .map(|l| Line::from(l.to_string()))
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("log")),
            log_area,
        );

        self.draw_input(frame, chunks[3]);

        let footer = if self.status.is_empty() {
            "Enter send · \\+Enter newline · / commands · ↑↓ history · PgUp/PgDn scroll · Ctrl+C quit"
                .to_string()
        } else {
            self.status.clone()
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                footer,
                Style::default().add_modifier(Modifier::DIM),
            ))),
            chunks[4],
        );

        if let Some(popup) = &self.popup {
            let height = popup.required_height().min(area.height.saturating_sub(4));
            let popup_area = Rect::new(
                chunks[3].x,
                chunks[3].y.saturating_sub(height),
                chunks[3].width.min(64),
                height,
            );
            popup.render(frame, popup_area);
        }

        if let Some(modal) = &self.modal {
            modal.render(frame, area);
        }
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let value = self.composer.value();
        let inner_width = area.width.saturating_sub(3) as usize;
        // Show the tail of the last line when it overflows the widget.
        let last_line = value.lines().last().unwrap_or("");
        let mut shown: String = last_line.to_string();
        while shown.width() > inner_width && !shown.is_empty() {
            shown.remove(0);
        }
        let prefix = if value.contains('\n') { "… " } else { "> " };
        frame.render_widget(
            Paragraph::new(Line::from(format!("{prefix}{shown}")))
                .block(Block::default().borders(Borders::ALL).title("input")),
            area,
        );
    }
}

/// Build the agent, spawn the worker and the input pump, and run the
/// render loop until exit. `initial_lines` are submitted before any
/// keyboard input is read (used by `--resume`).
pub async fn run_app(
    config: Config,
    client: Option<Arc<dyn ModelClient>>,
    initial_lines: Vec<String>,
) -> Result<()> {
    let (event_tx, event_rx) = unbounded_channel::<AgentEvent>();
    let ui = Arc::new(UiBridge::new(event_tx));
    let (submission_tx, submission_rx) = unbounded_channel::<String>();
    let (app_tx, app_rx) = unbounded_channel::<AppEvent>();
    let app_events = AppEventSender::new(app_tx);

    let registry = register_builtins();
    let command_snapshot: Vec<(String, String)> = registry
        .commands()
        .iter()
        .map(|c| (c.name().to_string(), c.description().to_string()))
        .collect();

    let agent = Agent::new(config.clone(), client, ui.clone());
    agent.publish_model_info();
    let worker = tokio::spawn(agent_worker(agent, registry, submission_rx));
    for line in initial_lines {
        let _ = submission_tx.send(line);
    }

    // Pump agent events and terminal input onto the single app channel so
    // FIFO order is preserved per source.
    let pump_events = app_events.clone();
    let event_pump = tokio::spawn(async move {
        let mut event_rx = event_rx;
        while let Some(event) = event_rx.recv().await {
            pump_events.send(AppEvent::Agent(event));
        }
    });
    let input_events = app_events.clone();
    let input_pump = tokio::spawn(async move {
        let mut stream = crossterm::event::EventStream::new();
        while let Some(Ok(event)) = stream.next().await {
            match event {
                CtEvent::Key(key) => input_events.send(AppEvent::Key(key)),
                CtEvent::Paste(text) => input_events.send(AppEvent::Paste(text)),
                CtEvent::Resize(w, h) => input_events.send(AppEvent::Resize(w, h)),
                _ => {}
            }
        }
    });

    let mut terminal = setup_terminal()?;
    let mut app = App::new(config, ui.clone(), submission_tx, command_snapshot);
    let result = run_loop(&mut app, &mut terminal, app_rx).await;
    restore_terminal()?;

    // Teardown: outstanding prompts resolve to their defaults, the worker
    // sees its submission channel close and stops.
    ui.cancel_all();
    input_pump.abort();
    event_pump.abort();
    worker.abort();
    result
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app_rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    terminal.draw(|frame| app.draw(frame))?;
    while let Some(event) = app_rx.recv().await {
        app.handle_event(event);
        // Drain whatever arrived in the meantime before redrawing.
        while let Ok(event) = app_rx.try_recv() {
            app.handle_event(event);
        }
        if app.done {
            break;
        }
        terminal.draw(|frame| app.draw(frame))?;
    }
    Ok(())
}

/// The agent worker: one submission at a time, commands through the
/// dispatcher, free text through the conversational turn.
async fn agent_worker(
    mut agent: Agent,
    registry: ledit_core::registry::CommandRegistry,
    mut submissions: UnboundedReceiver<String>,
) {
    while let Some(line) = submissions.recv().await {
        tracing::debug!(line = %line, "worker received submission");
        if registry::is_command(&line) {
            match registry.dispatch(&line, &mut agent).await {
                Ok(()) => {}
                Err(e) if e.is_interrupt() => agent.ui.log("🔄 Cancelled."),
                Err(e) => agent.ui.log(format!(
                    "❌ Command error: {e}\n💡 Try /help for available commands."
                )),
            }
        } else if let Err(e) = agent.process_query(&line).await {
            agent.ui.log(format!("❌ {e}"));
        }
        if agent.exit_requested() {
            agent.ui.send(AgentEvent::Shutdown);
            break;
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    use crossterm::execute;
    use crossterm::terminal::EnterAlternateScreen;
    use crossterm::terminal::enable_raw_mode;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        crossterm::event::EnableBracketedPaste
    )?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() -> Result<()> {
    use crossterm::execute;
    use crossterm::terminal::LeaveAlternateScreen;
    use crossterm::terminal::disable_raw_mode;

    let mut stdout = std::io::stdout();
    execute!(
        stdout,
        crossterm::event::DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn test_app() -> (App, UnboundedReceiver<String>) {
        let dir = tempdir().unwrap();
        let (event_tx, _event_rx) = unbounded_channel();
        let ui = Arc::new(UiBridge::new(event_tx));
        let (submission_tx, submission_rx) = unbounded_channel();
        let config = ledit_core::config::test_config(dir.path());
        let snapshot = vec![
            ("clear".to_string(), "Clear".to_string()),
            ("help".to_string(), "Help".to_string()),
        ];
        (App::new(config, ui, submission_tx, snapshot), submission_rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn slash_opens_suggestions_and_submit_dispatches() {
        let (mut app, mut rx) = test_app();
        type_text(&mut app, "/he");
        assert!(app.popup.is_some());
        press(&mut app, KeyCode::Enter);
        assert!(app.popup.is_none());
        assert_eq!(rx.try_recv().unwrap(), "/he");
    }

    #[test]
    fn bare_slash_enters_selection_mode() {
        let (mut app, mut rx) = test_app();
        type_text(&mut app, "/");
        press(&mut app, KeyCode::Enter);
        assert!(app.selecting_command);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(!app.selecting_command);
        assert_eq!(rx.try_recv().unwrap(), "/help");
    }

    #[test]
    fn modal_swallows_input_and_resolves() {
        let (mut app, mut rx) = test_app();
        app.handle_agent_event(AgentEvent::Prompt {
            request: ledit_protocol::PromptRequest {
                id: 7,
                prompt: "ok?".to_string(),
                context: String::new(),
                yes_no: true,
                default_yes: false,
            },
        });
        assert!(app.modal.is_some());

        // Keystrokes do not reach the composer while the modal is up.
        press(&mut app, KeyCode::Char('x'));
        assert!(app.composer.is_empty());

        press(&mut app, KeyCode::Char('y'));
        assert!(app.modal.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ctrl_c_requests_exit() {
        let (mut app, _rx) = test_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.done);
    }

    #[test]
    fn shutdown_event_ends_the_loop() {
        let (mut app, _rx) = test_app();
        app.handle_agent_event(AgentEvent::Shutdown);
        assert!(app.done);
    }

    #[test]
    fn stream_events_toggle_the_flag() {
        let (mut app, _rx) = test_app();
        app.handle_agent_event(AgentEvent::StreamStart);
        assert!(app.streaming);
        app.handle_agent_event(AgentEvent::StreamDelta {
            text: "hi".to_string(),
        });
        app.handle_agent_event(AgentEvent::StreamEnd);
        assert!(!app.streaming);
    }
}
