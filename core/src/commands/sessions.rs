//! `/sessions` — list, load, rename, delete, export, import.

use std::path::Path;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

pub struct SessionsCommand;

#[async_trait]
impl Command for SessionsCommand {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn description(&self) -> &'static str {
        "Manage saved sessions (list/load/rename/delete/export/import)."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.split_first() {
            None => interactive_pick(agent).await,
            Some((sub, rest)) => match sub.as_str() {
                "list" => {
                    let listing = render_listing(agent)?;
                    agent.ui.log(listing);
                    Ok(())
                }
                "load" => {
                    let (selector, rest) = rest
                        .split_first()
                        .ok_or_else(|| usage("load <n|id> [--full]"))?;
                    let full = rest.iter().any(|a| a == "--full");
                    load(agent, selector, full)
                }
                "rename" => {
                    let (selector, name_parts) =
                        rest.split_first().ok_or_else(|| usage("rename <n|id> <name>"))?;
                    if name_parts.is_empty() {
                        return Err(usage("rename <n|id> <name>"));
                    }
                    let session_id = agent.sessions.resolve_selector(selector)?;
                    agent
                        .sessions
                        .rename_session(&session_id, &name_parts.join(" "))?;
                    agent.ui.log(format!("✅ Renamed {session_id}"));
                    Ok(())
                }
                "delete" => {
                    let (selector, _) =
                        rest.split_first().ok_or_else(|| usage("delete <n|id>"))?;
                    let session_id = agent.sessions.resolve_selector(selector)?;
                    agent.sessions.delete_session(&session_id)?;
                    agent.ui.log(format!("✅ Deleted {session_id}"));
                    Ok(())
                }
                "export" => {
                    let [selector, file] = rest else {
                        return Err(usage("export <n|id> <file>"));
                    };
                    let session_id = agent.sessions.resolve_selector(selector)?;
                    let state = agent.sessions.load_state_without_agent(&session_id)?;
                    let json = agent.sessions.export_state_to_json(&state)?;
                    std::fs::write(file, json)?;
                    agent.ui.log(format!("✅ Exported {session_id} to {file}"));
                    Ok(())
                }
                "import" => {
                    let (file, _) = rest.split_first().ok_or_else(|| usage("import <file>"))?;
                    let state = agent
                        .sessions
                        .import_state_from_json_file(Path::new(file))?;
                    agent.sessions.save_state(&state)?;
                    agent.ui.log(format!(
                        "✅ Imported session {} ({} messages)",
                        state.session_id,
                        state.messages.len()
                    ));
                    Ok(())
                }
                // Bare `<n>` is shorthand for `load <n>`.
                selector if selector.parse::<usize>().is_ok() => load(agent, selector, false),
                other => Err(usage(&format!("unknown subcommand: {other}"))),
            },
        }
    }
}

fn usage(detail: &str) -> LeditErr {
    LeditErr::Usage(format!("usage: /sessions {detail}"))
}

fn render_listing(agent: &Agent) -> Result<String> {
    let listings = agent.sessions.list_sessions_with_timestamps()?;
    if listings.is_empty() {
        return Ok("No saved sessions.".to_string());
    }
    let mut out = String::from("Saved sessions (newest first):\n");
    for (i, listing) in listings.iter().enumerate() {
        let label = match &listing.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => agent
                .sessions
                .get_session_preview(&listing.session_id)
                .unwrap_or_else(|_| "(unreadable)".to_string()),
        };
        out.push_str(&format!(
            "{:>3}. {}  {}  {} msgs  {}\n",
            i + 1,
            &listing.session_id[..listing.session_id.len().min(8)],
            listing.last_updated.format("%Y-%m-%d %H:%M"),
            listing.message_count,
            label,
        ));
    }
    Ok(out.trim_end().to_string())
}

/// `/sessions` with no args: show the list and take an index or id prefix.
async fn interactive_pick(agent: &mut Agent) -> Result<()> {
    let listing = render_listing(agent)?;
    if listing.starts_with("No saved") {
        agent.ui.log(listing);
        return Ok(());
    }
    let Some(choice) = agent
        .ui
        .ask("Load which session? (index or id prefix, empty to cancel)", listing)
        .await
    else {
        return Ok(());
    };
    let choice = choice.trim().to_string();
    if choice.is_empty() {
        return Ok(());
    }
    load(agent, &choice, false)
}

fn load(agent: &mut Agent, selector: &str, full: bool) -> Result<()> {
    let session_id = agent.sessions.resolve_selector(selector)?;
    let state = agent.sessions.load_state(&session_id)?;
    let message_count = state.messages.len();
    agent.apply_state(state, full);
    // The confirmation names the restore mode so operators know whether the
    // model will see the old messages or only the summary.
    let mode = if full {
        format!("full history, {message_count} messages")
    } else {
        "summary only".to_string()
    };
    agent.ui.log(format!("✅ Loaded session {session_id} ({mode})"));
    Ok(())
}
