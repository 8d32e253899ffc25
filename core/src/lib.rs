//! Core of the terminal coding assistant: agent state, the slash-command
//! registry and every command behind it, the git commit workflow, the
//! revision tracker, session persistence, and the provider/model/persona
//! configuration surface.
//!
//! The TUI lives in `ledit-tui` and talks to this crate exclusively through
//! [`protocol`] events plus the [`agent::UiBridge`] prompt channel, so the
//! core never touches the terminal directly.

pub mod agent;
pub mod client;
pub mod commands;
pub mod commit;
pub mod commit_review;
pub mod config;
pub mod diff_optimizer;
pub mod error;
pub mod git;
pub mod models;
pub mod persona;
pub mod project_context;
pub mod providers;
pub mod registry;
pub mod revision;
pub mod session;
pub mod shell;

pub use error::LeditErr;
pub use error::Result;
pub use ledit_protocol as protocol;
