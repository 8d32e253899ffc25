//! `/commit` — operator surface over the commit workflow.

use async_trait::async_trait;

use ledit_protocol::CommitJsonResult;
use ledit_protocol::CommitStatus;

use crate::agent::Agent;
use crate::commit::CommitOptions;
use crate::commit::run_commit;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

const USAGE: &str = "usage: /commit [help] [--skip-prompt] [--dry-run] [--allow-secrets] [--json]";

pub struct CommitCommand;

fn parse_flags(args: &[String]) -> Result<(CommitOptions, bool, bool)> {
    let mut options = CommitOptions::default();
    let mut json = false;
    let mut help = false;
    for arg in args {
        match arg.as_str() {
            "help" => help = true,
            "--skip-prompt" => options.skip_prompt = true,
            "--dry-run" => options.dry_run = true,
            "--allow-secrets" => options.allow_secrets = true,
            "--json" => json = true,
            other => {
                return Err(LeditErr::Usage(format!("unknown flag: {other}\n{USAGE}")));
            }
        }
    }
    Ok((options, json, help))
}

#[async_trait]
impl Command for CommitCommand {
    fn name(&self) -> &'static str {
        "commit"
    }

    fn description(&self) -> &'static str {
        "Generate, review and create a git commit for the staged changes."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        let (options, json, help) = parse_flags(args)?;
        if help {
            agent.ui.log(USAGE.to_string());
            return Ok(());
        }

        if json {
            let result = self.execute_json(args, agent).await?;
            agent.ui.log(serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        match run_commit(agent, options).await {
            Ok(_) => Ok(()),
            // Operator cancellation is a clean return, not a failure.
            Err(e) if e.is_interrupt() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Structured mode: failures become `{status: error}` objects rather
    /// than surfaced errors, so callers always get one valid JSON result.
    async fn execute_json(&self, args: &[String], agent: &mut Agent) -> Result<serde_json::Value> {
        let (mut options, _json, _help) = parse_flags(args)?;
        // JSON mode is non-interactive by definition.
        options.skip_prompt = true;

        let result = match run_commit(agent, options).await {
            Ok(result) => result,
            Err(e) => {
                let error_result = CommitJsonResult {
                    status: CommitStatus::Error,
                    commit: None,
                    message: None,
                    branch: None,
                    error: Some(e.to_string()),
                    review: None,
                };
                error_result
                    .validate()
                    .map_err(LeditErr::Invariant)?;
                error_result
            }
        };
        Ok(serde_json::to_value(&result)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use crate::client::ModelClient;
    use crate::client::testing::ScriptedClient;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn flags_parse_independently() {
        let args: Vec<String> = vec!["--dry-run".into(), "--allow-secrets".into(), "--json".into()];
        let (options, json, help) = parse_flags(&args).unwrap();
        assert!(options.dry_run);
        assert!(options.allow_secrets);
        assert!(!options.skip_prompt);
        assert!(json);
        assert!(!help);

        assert!(parse_flags(&vec!["--bogus".to_string()]).is_err());
    }

    #[tokio::test]
    async fn json_mode_emits_dry_run_object() {
        let dir = tempdir().unwrap();
        crate::git::run_git(dir.path(), &["init", "-q", "-b", "main"])
            .await
            .unwrap();
        std::fs::write(dir.path().join("foo.go"), "+func A() {}\n").unwrap();
        crate::git::stage_files(dir.path(), &["foo.go".to_string()])
            .await
            .unwrap();

        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec![
            "No critical concerns found.",
            "Adds stub",
            "Adds the stub function.",
        ]));
        let (mut agent, _rx) = agent_with_events(dir.path(), Some(client));

        let value = CommitCommand
            .execute_json(&["--dry-run".to_string()], &mut agent)
            .await
            .unwrap();
        assert_eq!(value["status"], "dry-run");
        assert_eq!(
            value["message"],
            "Dry-run mode: commit message generated successfully without creating commit"
        );
    }

    #[tokio::test]
    async fn json_mode_wraps_failures_as_error_objects() {
        let dir = tempdir().unwrap();
        // Not a git repository at all.
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        let value = CommitCommand.execute_json(&[], &mut agent).await.unwrap();
        assert_eq!(value["status"], "error");
        assert!(value["error"].as_str().unwrap().contains("git"));
    }
}
