use thiserror::Error;

pub type Result<T> = std::result::Result<T, LeditErr>;

/// Error taxonomy shared by every command and workflow stage.
///
/// The dispatcher prints whatever bubbles up and keeps the session alive;
/// nothing here is fatal except by the caller's choice.
#[derive(Error, Debug)]
pub enum LeditErr {
    /// Malformed command line. Surfaced verbatim with a usage hint.
    #[error("{0}")]
    Usage(String),

    /// Missing or inconsistent configuration (unknown provider/model,
    /// absent persona, unreadable config file).
    #[error("{0}")]
    Config(String),

    /// An LLM request failed or returned no choices.
    #[error("{0}")]
    Transport(String),

    /// A git or shell subprocess exited nonzero; `output` is the combined
    /// stdout+stderr so the operator sees what the tool saw.
    #[error("{context}: {output}")]
    Integration { context: String, output: String },

    /// Programmer-facing invariant violation (e.g. a JSON result that fails
    /// its own schema). Not expected in normal operation.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The operator cancelled (Ctrl+C or a modal default). Returns cleanly.
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LeditErr {
    pub fn integration(context: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Integration {
            context: context.into(),
            output: output.into(),
        }
    }

    /// Cancellation is not an error from the operator's point of view.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
