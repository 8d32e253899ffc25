//! `/shell <description>`: generate a shell snippet from natural language,
//! validate that it is actually code, confirm, then run it.

use async_trait::async_trait;

use ledit_protocol::Message;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;
use crate::shell::looks_like_code;
use crate::shell::run_shell;

pub struct ShellCommand;

#[async_trait]
impl Command for ShellCommand {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn description(&self) -> &'static str {
        "Generate a shell command from a description, confirm, run."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        if args.is_empty() {
            return Err(LeditErr::Usage("usage: /shell <what you want done>".to_string()));
        }
        let description = args.join(" ");
        let client = agent.client.clone().ok_or_else(|| {
            LeditErr::Transport("shell generation needs a model client".to_string())
        })?;

        let prompt = format!(
            "Write a single {shell} command (or short pipeline) that does the\n\
             following. Output only the command, no explanation, no fences:\n\n{description}",
            shell = agent.config.shell,
        );
        let completion = client.complete(&agent.model, &[Message::user(prompt)]).await?;
        let draft = completion.content.trim().trim_matches('`').trim().to_string();

        if !looks_like_code(&draft) {
            return Err(LeditErr::Transport(format!(
                "model returned prose instead of a command: {draft}"
            )));
        }

        if !agent.ui.confirm("Run this command?", &draft, false).await {
            agent.ui.log("🔄 Skipped.");
            return Ok(());
        }

        let shell = agent.config.shell.clone();
        let cwd = agent.config.cwd.clone();
        let output = run_shell(&shell, &cwd, &draft).await?;
        agent.ui.log(output.combined.trim_end().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use crate::agent::test_support::autorespond;
    use crate::client::ModelClient;
    use crate::client::testing::ScriptedClient;
    use ledit_protocol::PromptAnswer;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn prose_draft_is_rejected() {
        let dir = tempdir().unwrap();
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec![
            "Here is the command you should run to count files",
        ]));
        let (mut agent, _rx) = agent_with_events(dir.path(), Some(client));
        let err = ShellCommand
            .execute(&["count".to_string(), "files".to_string()], &mut agent)
            .await
            .unwrap_err();
        assert!(matches!(err, LeditErr::Transport(_)), "{err}");
    }

    #[tokio::test]
    async fn approved_draft_is_executed() {
        let dir = tempdir().unwrap();
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec!["echo generated"]));
        let (mut agent, rx) = agent_with_events(dir.path(), Some(client));
        let responder = autorespond(
            agent.ui.clone(),
            rx,
            vec![PromptAnswer::YesNo { value: true }],
        );

        ShellCommand
            .execute(&["say".to_string(), "generated".to_string()], &mut agent)
            .await
            .unwrap();
        responder.abort();
    }
}
