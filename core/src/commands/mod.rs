//! Built-in slash commands.
//!
//! One file per command family. `register_builtins` wires every command
//! into a fresh registry; `/help` receives a snapshot of the final table so
//! it can print it without a back-reference to the registry.

mod changes;
mod clear;
mod commit_cmd;
mod continuity;
mod exec;
mod exit;
mod help;
mod init;
mod mcp;
mod memory;
mod models_cmd;
mod persona_cmd;
mod provider;
mod review;
mod sessions;
mod shell_cmd;

use std::sync::Arc;

use crate::registry::Command;
use crate::registry::CommandRegistry;

/// Build the default registry. Built-ins are registered first, so later
/// registrations may override them by name.
pub fn register_builtins() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    let commands: Vec<Arc<dyn Command>> = vec![
        Arc::new(models_cmd::ModelsCommand),
        Arc::new(provider::ProviderCommand),
        Arc::new(sessions::SessionsCommand),
        Arc::new(memory::MemoryCommand),
        Arc::new(clear::ClearCommand),
        Arc::new(continuity::ContinuityCommand),
        Arc::new(changes::ChangesCommand),
        Arc::new(changes::StatusCommand),
        Arc::new(changes::LogCommand),
        Arc::new(changes::RollbackCommand),
        Arc::new(commit_cmd::CommitCommand),
        Arc::new(review::ReviewCommand),
        Arc::new(review::ReviewDeepCommand),
        Arc::new(exec::ExecCommand),
        Arc::new(shell_cmd::ShellCommand),
        Arc::new(init::InitCommand),
        Arc::new(persona_cmd::PersonaCommand),
        Arc::new(persona_cmd::SubagentPersonasCommand),
        Arc::new(persona_cmd::SubagentPersonaCommand),
        Arc::new(persona_cmd::SubagentProviderCommand),
        Arc::new(persona_cmd::SubagentModelCommand),
        Arc::new(mcp::McpCommand),
        Arc::new(exit::ExitCommand::new("exit")),
        Arc::new(exit::ExitCommand::new("quit")),
        Arc::new(exit::ExitCommand::new("q")),
    ];

    let mut listing: Vec<(&'static str, &'static str)> = commands
        .iter()
        .map(|c| (c.name(), c.description()))
        .collect();
    listing.push(("help", help::DESCRIPTION));
    listing.sort_by_key(|(name, _)| *name);

    for command in commands {
        registry.register(command);
    }
    registry.register(Arc::new(help::HelpCommand::new(listing)));
    registry
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn builtins_cover_the_documented_surface() {
        let registry = register_builtins();
        for name in [
            "help",
            "models",
            "provider",
            "sessions",
            "memory",
            "clear",
            "continuity",
            "changes",
            "status",
            "log",
            "rollback",
            "commit",
            "review",
            "review-deep",
            "exec",
            "shell",
            "init",
            "persona",
            "subagent-personas",
            "subagent-persona",
            "subagent-provider",
            "subagent-model",
            "mcp",
            "exit",
            "quit",
            "q",
        ] {
            assert!(registry.get(name).is_some(), "missing builtin: {name}");
        }
    }

    #[test]
    fn listing_has_no_duplicates() {
        let registry = register_builtins();
        let commands = registry.commands();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name()).collect();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
