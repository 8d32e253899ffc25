use serde::Deserialize;
use serde::Serialize;

/// Event published by the agent worker and consumed by the TUI renderer.
///
/// Events are delivered over a single unbounded channel in FIFO publication
/// order; the TUI never reorders them. Log text is part of the user-visible
/// contract (including the emoji prefixes), so it is carried verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Append one line (or multi-line block) to the log viewport.
    Log { text: String },

    /// Ephemeral status line shown under the header until replaced.
    Status { text: String },

    /// Replace the progress model (token counters, cost, context usage).
    Progress { snapshot: ProgressSnapshot },

    /// The active provider/model changed; the header re-renders.
    ModelInfo { provider: String, model: String },

    /// A streamed assistant reply is starting.
    StreamStart,

    /// A chunk of streamed assistant output.
    StreamDelta { text: String },

    /// The streamed reply finished (successfully or not).
    StreamEnd,

    /// Ask the operator a question. The TUI enters its modal sub-state and
    /// answers through the response channel registered under `request.id`.
    Prompt { request: PromptRequest },

    /// The worker is gone; the TUI should tear down after draining.
    Shutdown,
}

/// Snapshot of the agent's token/cost counters for the progress line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cached_tokens: u64,
    pub total_tokens: u64,
    pub cost_usd: f64,
    /// Estimated share of the model context window in use, 0-100.
    pub context_percent: u8,
}

/// A modal question for the operator.
///
/// At most one request is outstanding per session; the worker blocks on the
/// matching [`PromptAnswer`] until the TUI responds or is torn down (in which
/// case the worker receives the documented default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Correlation id matching the request to its one-shot response channel.
    pub id: u64,
    /// The question itself, rendered as the overlay title.
    pub prompt: String,
    /// Longer context rendered above the question (may be empty).
    pub context: String,
    /// Yes/no variant when true; free-text variant otherwise.
    pub yes_no: bool,
    /// Default submitted on Enter/Esc for the yes/no variant.
    pub default_yes: bool,
}

/// Operator response to a [`PromptRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptAnswer {
    YesNo { value: bool },
    Text { value: String },
    /// The TUI was torn down or the operator cancelled; callers treat this
    /// as the request's default.
    Cancelled,
}
