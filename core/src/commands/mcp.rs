//! `/mcp` — external tool-endpoint management, persisted in `config.toml`.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::config::McpServerConfig;
use crate::error::LeditErr;
use crate::error::Result;
use crate::registry::Command;

pub struct McpCommand;

#[async_trait]
impl Command for McpCommand {
    fn name(&self) -> &'static str {
        "mcp"
    }

    fn description(&self) -> &'static str {
        "Manage external tool endpoints (list/add/remove/enable/disable)."
    }

    async fn execute(&self, args: &[String], agent: &mut Agent) -> Result<()> {
        match args.split_first().map(|(sub, rest)| (sub.as_str(), rest)) {
            None | Some(("list", _)) => {
                if agent.config.mcp_servers.is_empty() {
                    agent.ui.log("No tool endpoints configured.");
                    return Ok(());
                }
                let mut names: Vec<&String> = agent.config.mcp_servers.keys().collect();
                names.sort();
                let mut out = String::from("Tool endpoints:\n");
                for name in names {
                    let server = &agent.config.mcp_servers[name];
                    out.push_str(&format!(
                        "  {name:<16} {}  [{}]\n",
                        server.url,
                        if server.enabled { "enabled" } else { "disabled" }
                    ));
                }
                agent.ui.log(out.trim_end().to_string());
                Ok(())
            }
            Some(("add", rest)) => {
                let [name, url] = rest else {
                    return Err(usage("add <name> <url>"));
                };
                agent.config.mcp_servers.insert(
                    name.clone(),
                    McpServerConfig {
                        url: url.clone(),
                        enabled: true,
                    },
                );
                persist(agent)?;
                agent.ui.log(format!("✅ Added endpoint {name}"));
                Ok(())
            }
            Some(("remove", rest)) => {
                let name = rest.first().ok_or_else(|| usage("remove <name>"))?;
                if agent.config.mcp_servers.remove(name).is_none() {
                    return Err(LeditErr::Usage(format!("unknown endpoint: {name}")));
                }
                persist(agent)?;
                agent.ui.log(format!("✅ Removed endpoint {name}"));
                Ok(())
            }
            Some((toggle @ ("enable" | "disable"), rest)) => {
                let name = rest
                    .first()
                    .ok_or_else(|| usage(&format!("{toggle} <name>")))?;
                let enabled = toggle == "enable";
                let server = agent
                    .config
                    .mcp_servers
                    .get_mut(name)
                    .ok_or_else(|| LeditErr::Usage(format!("unknown endpoint: {name}")))?;
                server.enabled = enabled;
                persist(agent)?;
                agent.ui.log(format!("✅ {name} {toggle}d"));
                Ok(())
            }
            Some((other, _)) => Err(usage(&format!("unknown subcommand: {other}"))),
        }
    }
}

fn usage(detail: &str) -> LeditErr {
    LeditErr::Usage(format!("usage: /mcp {detail}"))
}

fn persist(agent: &Agent) -> Result<()> {
    agent.config.save_toml(&agent.config.to_toml())
}
