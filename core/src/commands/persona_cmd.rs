//! Persona and sub-agent configuration commands.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::persona::PersonaConfig;
use crate::persona::PersonaKind;
use crate::providers;
use crate::registry::Command;

pub struct PersonaCommand;

#[async_trait]
impl Command for PersonaCommand {
    fn name(&self) -> &'static str {
        "persona"
    }

    fn description(&self) -> &'static str {
        "Manage personas: list/create/show/apply/enable/configure/clear."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        run_persona_grammar(agent, PersonaKind::Agent, args).await
    }
}

/// `/subagent-personas`: list-only shorthand.
pub struct SubagentPersonasCommand;

#[async_trait]
impl Command for SubagentPersonasCommand {
    fn name(&self) -> &'static str {
        "subagent-personas"
    }

    fn description(&self) -> &'static str {
        "List sub-agent personas."
    }

    async fn execute(&self, _args: &[String], agent: &mut Agent) -> Result<()> {
        list_personas(agent, PersonaKind::Subagent)
    }
}

/// `/subagent-persona <...>`: the full grammar against the sub-agent table.
pub struct SubagentPersonaCommand;

#[async_trait]
impl Command for SubagentPersonaCommand {
    fn name(&self) -> &'static str {
        "subagent-persona"
    }

    fn description(&self) -> &'static str {
        "Manage sub-agent personas."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        run_persona_grammar(agent, PersonaKind::Subagent, args).await
    }
}

async fn run_persona_grammar(agent: &mut Agent, kind: PersonaKind, args: &[String]) -> Result<()> {
    let Some((first, rest)) = args.split_first() else {
        return list_personas(agent, kind);
    };

    match (first.as_str(), rest) {
        ("list", _) => list_personas(agent, kind),
        ("create", [name, ..]) => {
            agent.personas.create(kind, name)?;
            agent.ui.log(format!("✅ Created persona {name}"));
            Ok(())
        }
        ("create", []) => Err(usage("create <name>")),
        ("clear", _) => {
            match kind {
                PersonaKind::Agent => {
                    agent.clear_persona();
                    agent.ui.log("✅ Persona cleared.");
                }
                PersonaKind::Subagent => {
                    agent.config.subagent_provider = None;
                    agent.config.subagent_model = None;
                    agent.config.save_toml(&agent.config.to_toml())?;
                    agent.ui.log("✅ Sub-agent persona cleared.");
                }
            }
            Ok(())
        }
        (name, []) => show_persona(agent, kind, name),
        (name, [verb, verb_args @ ..]) => {
            persona_verb(agent, kind, name, verb, verb_args).await
        }
    }
}

async fn persona_verb(
    agent: &mut Agent,
    kind: PersonaKind,
    name: &str,
    verb: &str,
    args: &[String],
) -> Result<()> {
    match verb {
        "show" => show_persona(agent, kind, name),
        "apply" => apply_persona(agent, kind, name),
        "enable" | "disable" => {
            let enabled = verb == "enable";
            agent.personas.update(kind, name, |p| p.enabled = enabled)?;
            agent.ui.log(format!("✅ Persona {name} {verb}d"));
            Ok(())
        }
        "provider" => {
            let provider = args.first().ok_or_else(|| usage("<name> provider <p>"))?;
            providers::resolve_provider(provider)?;
            agent
                .personas
                .update(kind, name, |p| p.provider = Some(provider.clone()))?;
            agent.ui.log(format!("✅ {name}: provider = {provider}"));
            Ok(())
        }
        "model" => {
            let model = args.first().ok_or_else(|| usage("<name> model <m>"))?;
            agent
                .personas
                .update(kind, name, |p| p.model = Some(model.clone()))?;
            agent.ui.log(format!("✅ {name}: model = {model}"));
            Ok(())
        }
        "tools" => {
            let csv = args.first().ok_or_else(|| usage("<name> tools <csv>"))?;
            let tools: Vec<String> = csv
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            let updated = agent
                .personas
                .update(kind, name, |p| p.allowed_tools = Some(tools))?;
            for tool in updated.unknown_tools() {
                agent.ui.log(format!("⚠️ Unknown tool in allowlist: {tool}"));
            }
            agent.ui.log(format!("✅ {name}: tools updated"));
            Ok(())
        }
        "prompt" => {
            let file = args.first().ok_or_else(|| usage("<name> prompt <file>"))?;
            let path = std::path::PathBuf::from(file);
            if !path.is_file() {
                return Err(LeditErr::Config(format!("prompt file not found: {file}")));
            }
            agent.personas.update(kind, name, |p| {
                p.system_prompt_file = Some(path);
                p.system_prompt_text = None;
            })?;
            agent.ui.log(format!("✅ {name}: prompt file set"));
            Ok(())
        }
        "prompt-str" => {
            if args.is_empty() {
                return Err(usage("<name> prompt-str <text>"));
            }
            let text = args.join(" ");
            agent.personas.update(kind, name, |p| {
                p.system_prompt_text = Some(text);
                p.system_prompt_file = None;
            })?;
            agent.ui.log(format!("✅ {name}: prompt set"));
            Ok(())
        }
        other => Err(usage(&format!("unknown verb: {other}"))),
    }
}

fn list_personas(agent: &mut Agent, kind: PersonaKind) -> Result<()> {
    let personas = agent.personas.list(kind)?;
    if personas.is_empty() {
        agent.ui.log("No personas configured. Create one with `create <name>`.");
        return Ok(());
    }
    let mut out = String::from("Personas:\n");
    for (id, persona) in personas {
        let active = agent.persona_id.as_deref() == Some(id.as_str())
            && matches!(kind, PersonaKind::Agent);
        out.push_str(&format!(
            "{} {id:<16} {}  {}\n",
            if active { "▶" } else { " " },
            if persona.enabled { "[enabled] " } else { "[disabled]" },
            persona.description,
        ));
    }
    agent.ui.log(out.trim_end().to_string());
    Ok(())
}

fn show_persona(agent: &mut Agent, kind: PersonaKind, id: &str) -> Result<()> {
    let persona = agent.personas.get(kind, id)?;
    let mut out = format!(
        "{id}: {name}\n  enabled: {enabled}\n  description: {description}\n",
        name = persona.name,
        enabled = persona.enabled,
        description = persona.description,
    );
    if let Some(provider) = &persona.provider {
        out.push_str(&format!("  provider: {provider}\n"));
    }
    if let Some(model) = &persona.model {
        out.push_str(&format!("  model: {model}\n"));
    }
    if let Some(file) = &persona.system_prompt_file {
        out.push_str(&format!("  prompt file: {}\n", file.display()));
    }
    if persona.system_prompt_text.is_some() {
        out.push_str("  prompt: (inline)\n");
    }
    if let Some(tools) = &persona.allowed_tools {
        out.push_str(&format!("  tools: {}\n", tools.join(", ")));
    }
    agent.ui.log(out.trim_end().to_string());
    Ok(())
}

fn apply_persona(agent: &mut Agent, kind: PersonaKind, id: &str) -> Result<()> {
    let persona = agent.personas.get(kind, id)?;
    match kind {
        PersonaKind::Agent => {
            agent.apply_persona(id, &persona)?;
            agent.ui.log(format!("✅ Persona {id} active"));
        }
        PersonaKind::Subagent => {
            agent.config.subagent_provider = persona.provider.clone();
            agent.config.subagent_model = persona.model.clone();
            agent.config.save_toml(&agent.config.to_toml())?;
            agent.ui.log(format!("✅ Sub-agent persona {id} active"));
        }
    }
    Ok(())
}

fn usage(detail: &str) -> LeditErr {
    LeditErr::Usage(format!("usage: /persona {detail}"))
}

/// `/subagent-provider [<p>]`: read or set the sub-agent default provider.
pub struct SubagentProviderCommand;

#[async_trait]
impl Command for SubagentProviderCommand {
    fn name(&self) -> &'static str {
        "subagent-provider"
    }

    fn description(&self) -> &'static str {
        "Show or set the sub-agent provider."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.first() {
            None => {
                let current = agent
                    .config
                    .subagent_provider
                    .as_deref()
                    .unwrap_or("(inherits agent provider)");
                agent.ui.log(format!("Sub-agent provider: {current}"));
            }
            Some(provider) => {
                providers::resolve_provider(provider)?;
                agent.config.subagent_provider = Some(provider.clone());
                agent.config.save_toml(&agent.config.to_toml())?;
                agent.ui.log(format!("✅ Sub-agent provider: {provider}"));
            }
        }
        Ok(())
    }
}

/// `/subagent-model [<m>]`: read or set the sub-agent default model.
pub struct SubagentModelCommand;

#[async_trait]
impl Command for SubagentModelCommand {
    fn name(&self) -> &'static str {
        "subagent-model"
    }

    fn description(&self) -> &'static str {
        "Show or set the sub-agent model."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.first() {
            None => {
                let current = agent
                    .config
                    .subagent_model
                    .as_deref()
                    .unwrap_or("(inherits agent model)");
                agent.ui.log(format!("Sub-agent model: {current}"));
            }
            Some(model) => {
                agent.config.subagent_model = Some(model.clone());
                agent.config.save_toml(&agent.config.to_toml())?;
                agent.ui.log(format!("✅ Sub-agent model: {model}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use crate::agent::test_support::drain;
    use ledit_protocol::AgentEvent;
    use ledit_protocol::Role;
    use tempfile::tempdir;

    async fn run(agent: &mut Agent, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        PersonaCommand.execute(&args, agent).await
    }

    #[tokio::test]
    async fn create_configure_apply_flow() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);

        run(&mut agent, &["create", "reviewer"]).await.unwrap();
        run(&mut agent, &["reviewer", "prompt-str", "be", "strict"])
            .await
            .unwrap();
        run(&mut agent, &["reviewer", "model", "gpt-5-mini"])
            .await
            .unwrap();
        run(&mut agent, &["reviewer", "enable"]).await.unwrap();
        run(&mut agent, &["reviewer", "apply"]).await.unwrap();

        assert_eq!(agent.persona_id.as_deref(), Some("reviewer"));
        assert_eq!(agent.model, "gpt-5-mini");
        assert_eq!(agent.messages().first().map(|m| m.role), Some(Role::System));
        drain(&mut rx);

        run(&mut agent, &["clear"]).await.unwrap();
        assert!(agent.persona_id.is_none());
    }

    #[tokio::test]
    async fn unknown_tools_warn_but_do_not_abort() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);

        run(&mut agent, &["create", "p"]).await.unwrap();
        run(&mut agent, &["p", "tools", "read_file,telepathy"])
            .await
            .unwrap();

        let warned = drain(&mut rx).into_iter().any(|e| {
            matches!(e, AgentEvent::Log { text } if text.contains("Unknown tool") && text.contains("telepathy"))
        });
        assert!(warned);
    }

    #[tokio::test]
    async fn subagent_defaults_persist_to_config() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);

        SubagentProviderCommand
            .execute(&["groq".to_string()], &mut agent)
            .await
            .unwrap();
        SubagentModelCommand
            .execute(&["llama-3.3-70b-versatile".to_string()], &mut agent)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(agent.config.ledit_home.join("config.toml")).unwrap();
        assert!(raw.contains("subagent_provider"), "{raw}");
        assert!(raw.contains("llama-3.3-70b-versatile"), "{raw}");
    }
}
