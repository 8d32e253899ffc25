use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Result;
use crate::registry::Command;

/// `/exit`, `/quit` and `/q`: print the session summary and terminate with
/// code 0. Registered once per alias.
pub struct ExitCommand {
    name: &'static str,
}

impl ExitCommand {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Print the session summary and exit."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        agent.ui.log(agent.session_summary_text());
        agent.request_exit();
        Ok(())
    }
}
