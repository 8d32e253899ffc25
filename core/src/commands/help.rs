use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Result;
use crate::registry::Command;

pub const DESCRIPTION: &str = "Show available commands.";

pub struct HelpCommand {
    listing: Vec<(&'static str, &'static str)>,
}

impl HelpCommand {
    pub fn new(listing: Vec<(&'static str, &'static str)>) -> Self {
        Self { listing }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let width = self
            .listing
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        let mut out = String::from("Available commands (prefix with / — `!cmd` runs a shell command):\n");
        for (name, description) in &self.listing {
            out.push_str(&format!("  /{name:<width$}  {description}\n"));
        }
        agent.ui.log(out.trim_end().to_string());
        Ok(())
    }
}
