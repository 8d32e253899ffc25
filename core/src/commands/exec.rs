use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;
use crate::shell::run_shell;

/// `/exec <cmd>` and the `!<cmd>` sugar. The command line is passed to the
/// operator's shell verbatim.
pub struct ExecCommand;

#[async_trait]
impl Command for ExecCommand {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn description(&self) -> &'static str {
        "Run a shell command and show its combined output."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        if args.is_empty() {
            return Err(LeditErr::Usage("usage: /exec <command>".to_string()));
        }
        let command = args.join(" ");
        let shell = agent.config.shell.clone();
        let cwd = agent.config.cwd.clone();

        match run_shell(&shell, &cwd, &command).await {
            Ok(output) => {
                agent.ui.log(output.combined.trim_end().to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use crate::agent::test_support::drain;
    use ledit_protocol::AgentEvent;
    use tempfile::tempdir;

    #[tokio::test]
    async fn exec_logs_combined_output() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);

        ExecCommand
            .execute(&["echo".to_string(), "hi".to_string()], &mut agent)
            .await
            .unwrap();
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::Log { text } if text.contains("hi"))));
    }

    #[tokio::test]
    async fn exec_without_args_is_a_usage_error() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        let err = ExecCommand.execute(&[], &mut agent).await.unwrap_err();
        assert!(matches!(err, LeditErr::Usage(_)));
    }
}
