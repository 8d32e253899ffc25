use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Result;
use crate::project_context;
use crate::registry::Command;

pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    fn name(&self) -> &'static str {
        "init"
    }

    fn description(&self) -> &'static str {
        "Survey the repository and write .project_context.md."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let cwd = agent.config.cwd.clone();
        let target = tokio::task::spawn_blocking(move || project_context::generate(&cwd))
            .await
            .map_err(|e| crate::error::LeditErr::integration("init task failed", e.to_string()))??;
        agent.ui.log(format!("✅ Wrote {}", target.display()));
        Ok(())
    }
}
