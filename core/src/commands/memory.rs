use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

/// `/memory [<n>]`: quick-load the nth most recent session (default the
/// most recent), summary-only.
pub struct MemoryCommand;

#[async_trait]
impl Command for MemoryCommand {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn description(&self) -> &'static str {
        "Quick-load a previous session summary."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        let index = match args.first() {
            None => 1usize,
            Some(raw) => raw
                .parse()
                .map_err(|_| LeditErr::Usage(format!("not a session index: {raw}")))?,
        };

        let listings = agent.sessions.list_sessions_with_timestamps()?;
        let listing = listings
            .get(index.saturating_sub(1))
            .ok_or_else(|| LeditErr::Usage(format!("no session at index {index}")))?;
        let state = agent.sessions.load_state(&listing.session_id)?;
        let summary = if state.summary.is_empty() {
            "(no summary recorded)".to_string()
        } else {
            state.summary.clone()
        };
        agent.apply_state(state, false);
        agent
            .ui
            .log(format!("📝 Loaded session {index} (summary only):\n{summary}"));
        Ok(())
    }
}
