//! The `ledit` binary: bootstrap configuration, logging and the model
//! client, then hand off to the TUI (or run a single headless query).

use std::io::IsTerminal;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use ledit_common::newline::normalize_newlines_for_terminal;
use ledit_core::agent::Agent;
use ledit_core::agent::UiBridge;
use ledit_core::client::ChatCompletionsClient;
use ledit_core::client::ModelClient;
use ledit_core::commands::register_builtins;
use ledit_core::config::Config;
use ledit_core::providers;
use ledit_core::registry;
use ledit_protocol::AgentEvent;

#[derive(Parser, Debug)]
#[command(name = "ledit", about = "Terminal-resident coding assistant", version)]
struct Cli {
    /// Override the configured provider for this run.
    #[arg(long)]
    provider: Option<String>,

    /// Override the configured model for this run.
    #[arg(long)]
    model: Option<String>,

    /// Load this saved session (summary only) before the first prompt.
    #[arg(long)]
    resume: Option<String>,

    /// Run one query or slash command headlessly and exit.
    #[arg(short, long)]
    query: Option<String>,
}

fn init_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(config.log_dir()).ok()?;
    let appender = tracing_appender::rolling::daily(config.log_dir(), "ledit-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn build_client(config: &Config) -> Option<Arc<dyn ModelClient>> {
    let provider = match providers::resolve_provider(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("⚠️ {e}");
            return None;
        }
    };
    match ChatCompletionsClient::new(&provider) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            eprintln!("⚠️ {e} — running without a model client.");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    let _log_guard = init_logging(&config);

    let client = build_client(&config);

    if let Some(query) = cli.query {
        return run_headless(config, client, cli.resume, &query).await;
    }

    config.agent_console = true;
    config.set_agent_env();

    let mut initial = Vec::new();
    if let Some(session) = cli.resume {
        initial.push(format!("/sessions load {session}"));
    }
    ledit_tui::run_app(config, client, initial).await
}

/// Headless one-shot: events are printed to stdout as they arrive, modal
/// prompts resolve to their defaults, the process exits when the line has
/// been handled.
async fn run_headless(
    config: Config,
    client: Option<Arc<dyn ModelClient>>,
    resume: Option<String>,
    line: &str,
) -> Result<()> {
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<AgentEvent>();
    let ui = Arc::new(UiBridge::new(event_tx));

    let is_tty = std::io::stdout().is_terminal();
    let printer_ui = ui.clone();
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = event_rx.recv().await {
            match event {
                AgentEvent::Log { text } => {
                    let mut block = normalize_newlines_for_terminal(&text, is_tty);
                    block.push('\n');
                    let _ = stdout.write_all(block.as_bytes());
                    let _ = stdout.flush();
                }
                AgentEvent::StreamDelta { text } => {
                    let _ = stdout
                        .write_all(normalize_newlines_for_terminal(&text, is_tty).as_bytes());
                    let _ = stdout.flush();
                }
                // No operator to ask: resolve with the documented default.
                AgentEvent::Prompt { request } => {
                    let answer = if request.yes_no {
                        ledit_protocol::PromptAnswer::YesNo {
                            value: request.default_yes,
                        }
                    } else {
                        ledit_protocol::PromptAnswer::Cancelled
                    };
                    printer_ui.resolve(request.id, answer);
                }
                AgentEvent::Shutdown => break,
                _ => {}
            }
        }
    });

    let registry = register_builtins();
    let mut agent = Agent::new(config, client, ui.clone());
    if let Some(session) = resume {
        registry
            .dispatch(&format!("/sessions load {session}"), &mut agent)
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }

    let exit_code = if registry::is_command(line) {
        match registry.dispatch(line, &mut agent).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("❌ Command error: {e}");
                1
            }
        }
    } else {
        match agent.process_query(line).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("❌ {e}");
                1
            }
        }
    };

    agent.ui.send(AgentEvent::Shutdown);
    let _ = printer.await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
