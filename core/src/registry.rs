//! Command registry and dispatch.
//!
//! The registry is a pure table: name to command, case-sensitive,
//! last-writer-wins on collision. Parsing strips the `/` or `!` prefix and
//! splits on whitespace; commands that need quoting parse their own args.
//! All failures are reported to the operator and never fatal.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;

#[async_trait]
pub trait Command: Send + Sync {
    /// Command name without the leading slash.
    fn name(&self) -> &'static str;

    /// Human-readable description for `/help` and the selection popup.
    fn description(&self) -> &'static str;

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()>;

    /// Structured variant for commands that support it (`/commit --json`).
    async fn execute_json(&self, _args: &[String], _agent: &mut Agent) -> Result<serde_json::Value> {
        Err(LeditErr::Usage(format!(
            "{} has no JSON output mode",
            self.name()
        )))
    }
}

/// A parsed invocation: the command name and its raw args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// True iff the trimmed line starts with `/` or `!`.
pub fn is_command(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('/') | Some('!'))
}

/// Parse a command line into `(name, args)`.
///
/// The bang prefix is operator sugar: `!ls -la` rewrites to `exec` with the
/// single arg `ls -la` (whitespace-normalized), matching familiar REPL
/// conventions. `!exec …` collapses to plain `exec …`.
pub fn parse(line: &str) -> Result<ParsedCommand> {
    let trimmed = line.trim_start();
    let (bang, rest) = match trimmed.chars().next() {
        Some('/') => (false, &trimmed[1..]),
        Some('!') => (true, &trimmed[1..]),
        _ => return Err(LeditErr::Usage(format!("not a command: {line}"))),
    };

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let Some((first, args)) = tokens.split_first() else {
        return Err(LeditErr::Usage("empty command".to_string()));
    };

    if bang && *first != "exec" {
        return Ok(ParsedCommand {
            name: "exec".to_string(),
            args: vec![tokens.join(" ")],
        });
    }

    Ok(ParsedCommand {
        name: (*first).to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
    })
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. A name collision deterministically replaces the
    /// prior entry, so built-ins registered first can be overridden.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Every registered command exactly once, sorted by name.
    pub fn commands(&self) -> Vec<Arc<dyn Command>> {
        let mut all: Vec<Arc<dyn Command>> = self.commands.values().cloned().collect();
        all.sort_by_key(|c| c.name());
        all
    }

    /// Parse, route and run. The command's error comes back verbatim for
    /// the dispatcher's caller to display.
    pub async fn dispatch(&self, line: &str, agent: &mut Agent) -> Result<()> {
        let parsed = parse(line)?;
        let command = self
            .get(&parsed.name)
            .ok_or_else(|| LeditErr::Usage(format!("unknown command: {}", parsed.name)))?;
        command.execute(&parsed.args, agent).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct Probe {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl Command for Probe {
        fn name(&self) -> &'static str {
            self.name
        }
        fn description(&self) -> &'static str {
            self.description
        }
        async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
            agent.ui.log(format!("{}:{}", self.name, args.join(",")));
            Ok(())
        }
    }

    #[test]
    fn is_command_matches_both_prefixes_only() {
        assert!(is_command("/help"));
        assert!(is_command("  /help"));
        assert!(is_command("!ls -la"));
        assert!(!is_command("help"));
        assert!(!is_command(""));
        assert!(!is_command("  plain text / with slash"));
    }

    #[test]
    fn parse_splits_on_whitespace() {
        let parsed = parse("/sessions load  3 --full").unwrap();
        assert_eq!(parsed.name, "sessions");
        assert_eq!(parsed.args, vec!["load", "3", "--full"]);
    }

    #[test]
    fn parse_rejects_empty_command() {
        for line in ["/", "!", "/   ", "!  "] {
            let err = parse(line).unwrap_err().to_string();
            assert_eq!(err, "empty command", "line: {line:?}");
        }
    }

    #[test]
    fn bang_rewrites_to_exec_with_joined_args() {
        let parsed = parse("!ls   -la").unwrap();
        assert_eq!(parsed.name, "exec");
        assert_eq!(parsed.args, vec!["ls -la"]);
    }

    #[test]
    fn bang_exec_collapses() {
        let parsed = parse("!exec ls -la").unwrap();
        assert_eq!(parsed.name, "exec");
        assert_eq!(parsed.args, vec!["ls", "-la"]);
    }

    #[test]
    fn registration_is_last_writer_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Probe {
            name: "x",
            description: "first",
        }));
        registry.register(Arc::new(Probe {
            name: "x",
            description: "second",
        }));
        assert_eq!(registry.commands().len(), 1);
        assert_eq!(registry.get("x").unwrap().description(), "second");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Probe {
            name: "help",
            description: "",
        }));
        assert!(registry.get("help").is_some());
        assert!(registry.get("Help").is_none());
    }

    #[tokio::test]
    async fn dispatch_routes_bang_lines_to_exec() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Probe {
            name: "exec",
            description: "",
        }));

        registry.dispatch("!ls -la", &mut agent).await.unwrap();
        let events = crate::agent::test_support::drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ledit_protocol::AgentEvent::Log { text } if text == "exec:ls -la"
        )));
    }

    #[tokio::test]
    async fn unknown_command_error_names_the_command() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        let registry = CommandRegistry::new();
        let err = registry.dispatch("/nope", &mut agent).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown command: nope");
    }
}
