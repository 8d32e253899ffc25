//! `/provider [select|<id>]`.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::LeditErr;
use crate::error::Result;
use crate::providers;
use crate::registry::Command;

pub struct ProviderCommand;

#[async_trait]
impl Command for ProviderCommand {
    fn name(&self) -> &'static str {
        "provider"
    }

    fn description(&self) -> &'static str {
        "List providers, or switch the active one."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.first().map(String::as_str) {
            None => {
                agent.ui.log(render_listing(&agent.provider));
                Ok(())
            }
            Some("select") => {
                let Some(choice) = agent
                    .ui
                    .ask("Switch to which provider?", render_listing(&agent.provider))
                    .await
                else {
                    return Ok(());
                };
                set_provider(agent, choice.trim())
            }
            Some(id) => set_provider(agent, id),
        }
    }
}

fn render_listing(active: &str) -> String {
    let providers = providers::built_in_providers();
    let mut ids: Vec<&String> = providers.keys().collect();
    ids.sort();

    let mut out = String::from("Providers:\n");
    for id in ids {
        let info = &providers[id];
        let marker = if id == active { "▶" } else { " " };
        let key = if info.local {
            "no key needed".to_string()
        } else {
            format!("key: ${}", info.env_key)
        };
        out.push_str(&format!("{marker} {id:<12} {}  ({key})\n", info.name));
    }
    out.trim_end().to_string()
}

fn set_provider(agent: &mut Agent, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LeditErr::Usage("usage: /provider [select|<id>]".to_string()));
    }
    agent.set_provider(id)?;
    agent.ui.log(format!(
        "✅ Active provider: {} (model {})",
        agent.provider, agent.model
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::agent::test_support::agent_with_events;
    use tempfile::tempdir;

    #[tokio::test]
    async fn switching_provider_adjusts_model() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        ProviderCommand
            .execute(&["groq".to_string()], &mut agent)
            .await
            .unwrap();
        assert_eq!(agent.provider, "groq");
        assert_eq!(agent.model, "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn unknown_provider_is_a_config_error() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        let err = ProviderCommand
            .execute(&["nope".to_string()], &mut agent)
            .await
            .unwrap_err();
        assert!(matches!(err, LeditErr::Config(_)));
    }
}
