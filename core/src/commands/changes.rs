//! Revision surface: `/changes`, `/status`, `/log`, `/rollback`.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

pub struct ChangesCommand;

#[async_trait]
impl Command for ChangesCommand {
    fn name(&self) -> &'static str {
        "changes"
    }

    fn description(&self) -> &'static str {
        "Show the file changes tracked this session."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        agent.ui.log(agent.tracker.changes_summary());
        Ok(())
    }
}

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn description(&self) -> &'static str {
        "Show session, model and change-tracking status."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let tracked = agent.tracker.tracked_files();
        let mut out = agent.session_summary_text();
        out.push_str(&format!(
            "\n  change tracking: {} ({} changes, {} files)",
            if agent.tracker.is_enabled() {
                "enabled"
            } else {
                "disabled"
            },
            agent.tracker.change_count(),
            tracked.len(),
        ));
        if let Some(revision_id) = agent.tracker.revision_id() {
            out.push_str(&format!("\n  revision: {revision_id}"));
        }
        if let Some(persona_id) = &agent.persona_id {
            out.push_str(&format!("\n  persona: {persona_id}"));
        }
        agent.ui.log(out);
        Ok(())
    }
}

pub struct LogCommand;

#[async_trait]
impl Command for LogCommand {
    fn name(&self) -> &'static str {
        "log"
    }

    fn description(&self) -> &'static str {
        "List revisions, newest first."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        let groups = agent.tracker.revision_groups();
        if groups.is_empty() {
            agent.ui.log("No revisions recorded this session.");
            return Ok(());
        }
        let mut out = String::new();
        for revision in groups {
            out.push_str(&format!(
                "{}  {}  {} change{}{}\n    {}\n",
                revision.revision_id,
                revision.timestamp.format("%Y-%m-%d %H:%M:%S"),
                revision.changes.len(),
                if revision.changes.len() == 1 { "" } else { "s" },
                if revision.reverted { "  (reverted)" } else { "" },
                revision.instructions,
            ));
        }
        agent.ui.log(out.trim_end().to_string());
        Ok(())
    }
}

pub struct RollbackCommand;

#[async_trait]
impl Command for RollbackCommand {
    fn name(&self) -> &'static str {
        "rollback"
    }

    fn description(&self) -> &'static str {
        "Undo every file change in a revision."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        let revision_id = args
            .first()
            .ok_or_else(|| LeditErr::Usage("usage: /rollback <revision-id>".to_string()))?;

        let report = agent.tracker.revert(revision_id)?;
        if report.already_reverted {
            agent.ui.log(format!("⚠️ {revision_id} already reverted"));
        } else if report.succeeded() {
            agent.ui.log(format!(
                "✅ Reverted {revision_id} ({} change{})",
                report.restored,
                if report.restored == 1 { "" } else { "s" }
            ));
        } else {
            agent.ui.log(format!(
                "❌ Revert of {revision_id} incomplete ({} restored):\n{}",
                report.restored,
                report.failures.join("\n")
            ));
        }
        Ok(())
    }
}
