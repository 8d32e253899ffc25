use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Result;
use crate::registry::Command;

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn description(&self) -> &'static str {
        "Clear the conversation history."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let dropped = agent.messages().len();
        agent.clear_conversation();
        agent.ui.log(format!("✅ Cleared {dropped} messages."));
        Ok(())
    }
}
