//! Types shared between the agent worker, the command layer and the TUI.
//!
//! Everything in this crate is a plain serde value: no I/O, no channels, no
//! behavior beyond small constructors and validation helpers. The agent and
//! the TUI communicate exclusively through these types, so keeping them in a
//! leaf crate prevents dependency cycles between `ledit-core` and
//! `ledit-tui`.

mod events;
mod items;

pub use events::AgentEvent;
pub use events::ProgressSnapshot;
pub use events::PromptAnswer;
pub use events::PromptRequest;
pub use items::ChangeOp;
pub use items::CommitJsonResult;
pub use items::CommitStatus;
pub use items::FileChange;
pub use items::Message;
pub use items::Revision;
pub use items::Role;
pub use items::SessionState;
pub use items::TokenUsage;
