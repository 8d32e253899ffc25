use crossterm::event::KeyEvent;
use ledit_protocol::AgentEvent;

/// Everything the [`crate::App`] loop consumes, multiplexed onto one
/// channel so events keep their publication order.
#[derive(Debug)]
pub(crate) enum AppEvent {
    /// Event published by the agent worker.
    Agent(AgentEvent),

    /// Keyboard input from the terminal.
    Key(KeyEvent),

    /// Bracketed paste from the terminal.
    Paste(String),

    /// Terminal resize.
    Resize(u16, u16),
}
