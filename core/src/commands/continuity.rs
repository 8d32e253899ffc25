//! `/continuity` — manual summary/state operations with caller-chosen ids,
//! layered over the same session store.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

pub struct ContinuityCommand;

#[async_trait]
impl Command for ContinuityCommand {
    fn name(&self) -> &'static str {
        "continuity"
    }

    fn description(&self) -> &'static str {
        "Manual continuity: summary/clear/save/load/list/delete."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.split_first().map(|(sub, rest)| (sub.as_str(), rest)) {
            None | Some(("summary", _)) => {
                let summary = agent.previous_summary();
                if summary.is_empty() {
                    agent.ui.log("No continuity summary recorded.");
                } else {
                    agent.ui.log(format!("📝 Summary:\n{summary}"));
                }
                Ok(())
            }
            Some(("clear", _)) => {
                agent.summary.clear();
                agent.ui.log("✅ Continuity summary cleared.");
                Ok(())
            }
            Some(("save", rest)) => {
                let id = rest.first().ok_or_else(|| usage("save <id>"))?;
                let mut state = agent.snapshot_state();
                state.session_id = id.clone();
                agent.sessions.save_state(&state)?;
                agent.ui.log(format!("✅ Saved continuity state as {id}"));
                Ok(())
            }
            Some(("load", rest)) => {
                let id = rest.first().ok_or_else(|| usage("load <id>"))?;
                let state = agent.sessions.load_state(id)?;
                agent.apply_state(state, false);
                agent.ui.log(format!("✅ Loaded continuity state {id} (summary only)"));
                Ok(())
            }
            Some(("list", _)) => {
                let listings = agent.sessions.list_sessions_with_timestamps()?;
                if listings.is_empty() {
                    agent.ui.log("No saved states.");
                    return Ok(());
                }
                let mut out = String::from("Saved states (newest first):\n");
                for listing in listings {
                    out.push_str(&format!(
                        "  {}  {}\n",
                        listing.session_id,
                        listing.last_updated.format("%Y-%m-%d %H:%M")
                    ));
                }
                agent.ui.log(out.trim_end().to_string());
                Ok(())
            }
            Some(("delete", rest)) => {
                let id = rest.first().ok_or_else(|| usage("delete <id>"))?;
                agent.sessions.delete_session(id)?;
                agent.ui.log(format!("✅ Deleted {id}"));
                Ok(())
            }
            Some((other, _)) => Err(usage(&format!("unknown subcommand: {other}"))),
        }
    }
}

fn usage(detail: &str) -> LeditErr {
    LeditErr::Usage(format!("usage: /continuity {detail}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_and_load_by_chosen_id() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        agent.summary = "checkpoint".to_string();

        ContinuityCommand
            .execute(&["save".to_string(), "cp1".to_string()], &mut agent)
            .await
            .unwrap();

        agent.summary.clear();
        ContinuityCommand
            .execute(&["load".to_string(), "cp1".to_string()], &mut agent)
            .await
            .unwrap();
        assert_eq!(agent.previous_summary(), "checkpoint");
    }
}
