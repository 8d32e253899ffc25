//! `/review` and `/review-deep`: pre-commit review of the staged set,
//! outside the commit workflow.

use async_trait::async_trait;

use ledit_protocol::Message;

use crate::agent::Agent;
use crate::commit_review::generate_commit_review;
use crate::error::LeditErr;
use crate::error::Result;
use crate::git;
use crate::registry::Command;

pub struct ReviewCommand;

#[async_trait]
impl Command for ReviewCommand {
    fn name(&self) -> &'static str {
        "review"
    }

    fn description(&self) -> &'static str {
        "Review the staged changes for critical problems."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let cwd = agent.config.cwd.clone();
        let staged = git::staged_files(&cwd).await?;
        if staged.is_empty() {
            agent.ui.log("Nothing staged to review.");
            return Ok(());
        }
        let raw_diff = git::staged_diff(&cwd).await?;
        let optimized = agent.diff_optimizer.optimize(&raw_diff);

        let review = generate_commit_review(
            agent.client.clone(),
            &agent.model,
            &staged,
            &optimized.content,
            &raw_diff,
        )
        .await;

        agent.ui.log(format!("📝 Review:\n{review}"));
        // Recorded through the single append entry point so a later query
        // can refer back to the review.
        agent.add_message(Message::assistant(format!("Pre-commit review:\n{review}")));
        Ok(())
    }
}

/// Per-file pass: each staged file's diff goes through the model alone so
/// big changesets do not drown out small risky edits.
pub struct ReviewDeepCommand;

#[async_trait]
impl Command for ReviewDeepCommand {
    fn name(&self) -> &'static str {
        "review-deep"
    }

    fn description(&self) -> &'static str {
        "Review each staged file separately."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        if agent.client.is_none() {
            return Err(LeditErr::Transport(
                "deep review needs a model client; /review falls back to heuristics".to_string(),
            ));
        }
        let cwd = agent.config.cwd.clone();
        let staged = git::staged_files(&cwd).await?;
        if staged.is_empty() {
            agent.ui.log("Nothing staged to review.");
            return Ok(());
        }

        let mut sections = Vec::new();
        for path in &staged {
            let raw_diff = git::staged_diff_for(&cwd, path).await?;
            let optimized = agent.diff_optimizer.optimize(&raw_diff);
            let review = generate_commit_review(
                agent.client.clone(),
                &agent.model,
                std::slice::from_ref(path),
                &optimized.content,
                &raw_diff,
            )
            .await;
            agent.ui.log(format!("📝 {path}:\n{review}"));
            sections.push(format!("{path}: {review}"));
        }
        agent.add_message(Message::assistant(format!(
            "Deep pre-commit review:\n{}",
            sections.join("\n")
        )));
        Ok(())
    }
}
