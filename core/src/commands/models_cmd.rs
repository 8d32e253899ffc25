//! `/models [select|<id>]`.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::models;
use crate::providers;
use crate::registry::Command;

pub struct ModelsCommand;

#[async_trait]
impl Command for ModelsCommand {
    fn name(&self) -> &'static str {
        "models"
    }

    fn description(&self) -> &'static str {
        "List models for the active provider, or select one."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.first().map(String::as_str) {
            None => list_models(agent),
            Some("select") => select_model(agent).await,
            Some(id) => {
                agent.set_model(id)?;
                agent.ui.log(format!(
                    "✅ Active model: {}/{}",
                    agent.provider, agent.model
                ));
                Ok(())
            }
        }
    }
}

fn list_models(agent: &mut Agent) -> Result<()> {
    let provider = providers::resolve_provider(&agent.provider)?;
    let featured = models::featured_models(&agent.provider);
    let catalog = models::models_for_provider(&agent.provider);
    if catalog.is_empty() {
        agent
            .ui
            .log(format!("No catalog for provider {}", agent.provider));
        return Ok(());
    }

    let mut out = format!("Models for {} ({}):\n", provider.name, agent.provider);
    for model in catalog {
        let star = if featured.contains(&model.id.as_str()) {
            "⭐ "
        } else {
            "   "
        };
        let features = model
            .features
            .iter()
            .map(|f| match *f {
                // Tool-capable models matter most for agent work.
                "tools" | "tool_choice" => format!("[{f}]"),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{star}{id}  —  {description}\n      {cost}, {context}k context{features}\n",
            id = model.id,
            description = model.description,
            cost = models::format_cost(&model, &provider),
            context = model.context_length / 1000,
            features = if features.is_empty() {
                String::new()
            } else {
                format!(", {features}")
            },
        ));
    }
    agent.ui.log(out.trim_end().to_string());
    Ok(())
}

/// Fuzzy selection over the active provider's catalog: ask for a query,
/// show the top 10, accept a number or an exact id.
async fn select_model(agent: &mut Agent) -> Result<()> {
    let Some(query) = agent
        .ui
        .ask("Search models (substring or provider/model):", "")
        .await
    else {
        return Ok(());
    };

    let ranked = models::rank_models(&agent.provider, &query);
    if ranked.is_empty() {
        agent.ui.log(format!("No models match {query}"));
        return Ok(());
    }

    let listing = ranked
        .iter()
        .enumerate()
        .map(|(i, (model, score))| {
            format!("{}. {}  ({score}) — {}", i + 1, model.id, model.description)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let Some(choice) = agent
        .ui
        .ask("Pick a model (number or exact id):", listing)
        .await
    else {
        return Ok(());
    };

    let choice = choice.trim();
    let selected = if let Ok(index) = choice.parse::<usize>() {
        ranked
            .get(index.saturating_sub(1))
            .map(|(model, _)| model.id.clone())
            .ok_or_else(|| LeditErr::Usage(format!("selection out of range: {index}")))?
    } else if models::find_model(&agent.provider, choice).is_some()
        || models::find_model_anywhere(choice).is_some()
    {
        choice.to_string()
    } else {
        return Err(LeditErr::Usage(format!("unknown model: {choice}")));
    };

    agent.set_model(&selected)?;
    agent.ui.log(format!(
        "✅ Active model: {}/{}",
        agent.provider, agent.model
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use crate::agent::test_support::autorespond;
    use crate::agent::test_support::drain;
    use ledit_protocol::AgentEvent;
    use ledit_protocol::PromptAnswer;
    use tempfile::tempdir;

    #[tokio::test]
    async fn listing_marks_featured_and_free_models() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);
        agent.set_provider("ollama").unwrap();
        drain(&mut rx);

        ModelsCommand.execute(&[], &mut agent).await.unwrap();
        let events = drain(&mut rx);
        let text = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Log { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<String>();
        assert!(text.contains("⭐"), "{text}");
        assert!(text.contains("FREE (local)"), "{text}");
        assert!(text.contains("[tools]"), "{text}");
    }

    #[tokio::test]
    async fn select_accepts_numeric_choice() {
        let dir = tempdir().unwrap();
        let (mut agent, rx) = agent_with_events(dir.path(), None);
        let responder = autorespond(
            agent.ui.clone(),
            rx,
            vec![
                PromptAnswer::Text {
                    value: "gpt".to_string(),
                },
                PromptAnswer::Text {
                    value: "1".to_string(),
                },
            ],
        );

        ModelsCommand
            .execute(&["select".to_string()], &mut agent)
            .await
            .unwrap();
        assert_eq!(agent.model, "gpt-5");
        responder.abort();
    }

    #[tokio::test]
    async fn direct_id_switches_provider_if_needed() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        ModelsCommand
            .execute(&["llama-3.1-8b-instant".to_string()], &mut agent)
            .await
            .unwrap();
        assert_eq!(agent.provider, "groq");
    }
}
