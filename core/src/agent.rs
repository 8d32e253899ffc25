//! The agent: conversational state plus the capability bridge to the UI.
//!
//! The agent worker owns its message history and counters exclusively;
//! commands borrow the whole agent mutably for the duration of `execute`.
//! All communication with the TUI goes through [`UiBridge`]: events flow
//! out over one unbounded channel, and modal questions are correlated
//! request/response pairs keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use uuid::Uuid;

use ledit_protocol::AgentEvent;
use ledit_protocol::Message;
use ledit_protocol::ProgressSnapshot;
use ledit_protocol::PromptAnswer;
use ledit_protocol::PromptRequest;
use ledit_protocol::Role;
use ledit_protocol::SessionState;
use ledit_protocol::TokenUsage;

use crate::client::ModelClient;
use crate::config::Config;
use crate::diff_optimizer::DiffOptimizer;
use crate::diff_optimizer::TruncatingOptimizer;
use crate::error::Result;
use crate::models;
use crate::persona::PersonaConfig;
use crate::persona::PersonaStore;
use crate::providers;
use crate::revision::RevisionTracker;
use crate::session::SessionStore;

/// Capability handed to the agent (and through it to commands) for talking
/// to whatever UI is attached. Tests substitute a recording double by
/// driving the channel ends directly.
pub struct UiBridge {
    tx: UnboundedSender<AgentEvent>,
    pending: Mutex<HashMap<u64, oneshot::Sender<PromptAnswer>>>,
    next_id: AtomicU64,
    /// Serializes prompts: at most one outstanding request per session.
    gate: tokio::sync::Mutex<()>,
}

impl UiBridge {
    pub fn new(tx: UnboundedSender<AgentEvent>) -> Self {
        Self {
            tx,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn send(&self, event: AgentEvent) {
        // A closed channel means the TUI is gone; events are best-effort.
        let _ = self.tx.send(event);
    }

    pub fn log(&self, text: impl Into<String>) {
        self.send(AgentEvent::Log { text: text.into() });
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(AgentEvent::Status { text: text.into() });
    }

    /// Ask the operator a question and await the answer.
    ///
    /// The await resolves to [`PromptAnswer::Cancelled`] when the TUI is
    /// torn down with the request outstanding, so the worker is never
    /// stranded.
    pub async fn prompt(
        &self,
        prompt: impl Into<String>,
        context: impl Into<String>,
        yes_no: bool,
        default_yes: bool,
    ) -> PromptAnswer {
        let _serialized = self.gate.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(id, tx);
        }
        self.send(AgentEvent::Prompt {
            request: PromptRequest {
                id,
                prompt: prompt.into(),
                context: context.into(),
                yes_no,
                default_yes,
            },
        });
        match rx.await {
            Ok(answer) => answer,
            Err(_) => PromptAnswer::Cancelled,
        }
    }

    /// Yes/no convenience: cancellation resolves to the request's default.
    pub async fn confirm(
        &self,
        prompt: impl Into<String>,
        context: impl Into<String>,
        default_yes: bool,
    ) -> bool {
        match self.prompt(prompt, context, true, default_yes).await {
            PromptAnswer::YesNo { value } => value,
            PromptAnswer::Text { value } => {
                matches!(value.trim().to_lowercase().as_str(), "y" | "yes" | "")
            }
            PromptAnswer::Cancelled => default_yes,
        }
    }

    /// Free-text convenience: `None` on cancellation.
    pub async fn ask(
        &self,
        prompt: impl Into<String>,
        context: impl Into<String>,
    ) -> Option<String> {
        match self.prompt(prompt, context, false, false).await {
            PromptAnswer::Text { value } => Some(value),
            PromptAnswer::YesNo { value } => Some(if value { "y" } else { "n" }.to_string()),
            PromptAnswer::Cancelled => None,
        }
    }

    /// Resolve an outstanding request. Returns false for unknown ids (stale
    /// responses after teardown).
    pub fn resolve(&self, id: u64, answer: PromptAnswer) -> bool {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        match sender {
            Some(sender) => sender.send(answer).is_ok(),
            None => false,
        }
    }

    /// Teardown: every outstanding prompt resolves as cancelled.
    pub fn cancel_all(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            for (_, sender) in pending.drain() {
                let _ = sender.send(PromptAnswer::Cancelled);
            }
        }
    }
}

pub struct Agent {
    pub config: Config,
    pub provider: String,
    pub model: String,
    pub session_id: String,
    pub summary: String,
    pub persona_id: Option<String>,
    pub usage: TokenUsage,
    pub tracker: RevisionTracker,
    pub sessions: SessionStore,
    pub personas: PersonaStore,
    pub client: Option<Arc<dyn ModelClient>>,
    pub diff_optimizer: Arc<dyn DiffOptimizer>,
    pub ui: Arc<UiBridge>,
    messages: Vec<Message>,
    exit_requested: bool,
}

impl Agent {
    pub fn new(config: Config, client: Option<Arc<dyn ModelClient>>, ui: Arc<UiBridge>) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let tracker = RevisionTracker::new(&config.revisions_dir(), &session_id);
        let sessions = SessionStore::new(config.sessions_dir());
        let personas = PersonaStore::new(config.personas_file());
        let provider = config.provider.clone();
        let model = config.model.clone();
        Self {
            config,
            provider,
            model,
            session_id,
            summary: String::new(),
            persona_id: None,
            usage: TokenUsage::default(),
            tracker,
            sessions,
            personas,
            client,
            diff_optimizer: Arc::new(TruncatingOptimizer::default()),
            ui,
            messages: Vec::new(),
            exit_requested: false,
        }
    }

    /// Single entry point for history appends; commands and the TUI must
    /// not push into the history any other way.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear_conversation(&mut self) {
        self.messages.clear();
        self.summary.clear();
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// One conversational turn: append the user text, stream the assistant
    /// reply, account usage, autosave.
    pub async fn process_query(&mut self, text: &str) -> Result<()> {
        self.add_message(Message::user(text));
        // Tool calls made while handling this request group under one
        // revision; an empty revision is discarded at seal time.
        self.tracker.open_revision(text);

        let Some(client) = self.client.clone() else {
            self.ui
                .log("⚠️ No model client configured; set the provider API key and retry.");
            return Ok(());
        };

        self.ui.send(AgentEvent::StreamStart);
        let completion = match client.complete(&self.model, &self.messages).await {
            Ok(completion) => completion,
            Err(e) => {
                self.ui.send(AgentEvent::StreamEnd);
                self.ui.log(format!("❌ Model request failed: {e}"));
                return Ok(());
            }
        };

        for line in completion.content.split_inclusive('\n') {
            self.ui.send(AgentEvent::StreamDelta {
                text: line.to_string(),
            });
        }
        self.ui.send(AgentEvent::StreamEnd);

        self.add_message(Message::assistant(completion.content));
        self.account_usage(completion.usage);
        self.tracker.seal_revision();
        self.autosave();
        Ok(())
    }

    fn account_usage(&mut self, mut sample: TokenUsage) {
        if let (Ok(provider), Some(model)) = (
            providers::resolve_provider(&self.provider),
            models::find_model(&self.provider, &self.model),
        ) {
            sample.cost_usd = models::cost_for_usage(&provider, &model, &sample);
        }
        self.usage.add(&sample);
        self.ui.send(AgentEvent::Progress {
            snapshot: self.progress_snapshot(),
        });
    }

    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        let context_length = models::find_model(&self.provider, &self.model)
            .map(|m| m.context_length)
            .unwrap_or(128_000);
        // Rough context estimate: four characters per token.
        let history_chars: usize = self.messages.iter().map(|m| m.content.len()).sum();
        let estimated_tokens = (history_chars / 4) as u64;
        let context_percent =
            ((estimated_tokens.saturating_mul(100)) / u64::from(context_length.max(1))).min(100);
        ProgressSnapshot {
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
            cached_tokens: self.usage.cached_tokens,
            total_tokens: self.usage.total_tokens,
            cost_usd: self.usage.cost_usd,
            context_percent: context_percent as u8,
        }
    }

    /// Switch models, hopping providers automatically when the id only
    /// exists elsewhere.
    pub fn set_model(&mut self, model_id: &str) -> Result<()> {
        if models::find_model(&self.provider, model_id).is_some() {
            self.model = model_id.to_string();
        } else if let Some((provider, model)) = models::find_model_anywhere(model_id) {
            self.ui.log(format!(
                "🔄 Switching provider {} -> {provider} for {model_id}",
                self.provider
            ));
            self.provider = provider;
            self.model = model.id;
        } else {
            return Err(crate::error::LeditErr::Config(format!(
                "unknown model: {model_id}"
            )));
        }
        self.publish_model_info();
        Ok(())
    }

    pub fn set_provider(&mut self, provider_id: &str) -> Result<()> {
        providers::resolve_provider(provider_id)?;
        self.provider = provider_id.to_string();
        // Keep the model when the new provider carries it; otherwise fall
        // back to the first featured entry.
        if models::find_model(provider_id, &self.model).is_none() {
            if let Some(first) = models::featured_models(provider_id).first() {
                self.model = (*first).to_string();
            }
        }
        self.publish_model_info();
        Ok(())
    }

    pub fn publish_model_info(&self) {
        self.ui.send(AgentEvent::ModelInfo {
            provider: self.provider.clone(),
            model: self.model.clone(),
        });
    }

    /// Activate a persona: provider/model overrides plus the system prompt
    /// installed as the leading system message. Unknown allowlisted tools
    /// warn but do not abort.
    pub fn apply_persona(&mut self, id: &str, persona: &PersonaConfig) -> Result<()> {
        for tool in persona.unknown_tools() {
            self.ui.log(format!("⚠️ Persona {id} allows unknown tool: {tool}"));
        }
        if let Some(provider) = &persona.provider {
            self.set_provider(provider)?;
        }
        if let Some(model) = &persona.model {
            self.set_model(model)?;
        }
        if let Some(prompt) = persona.system_prompt()? {
            match self.messages.first_mut() {
                Some(first) if first.role == Role::System => first.content = prompt,
                _ => self.messages.insert(0, Message::system(prompt)),
            }
        }
        self.persona_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_persona(&mut self) {
        self.persona_id = None;
        if self
            .messages
            .first()
            .is_some_and(|m| m.role == Role::System)
        {
            self.messages.remove(0);
        }
    }

    /// Snapshot for persistence/export.
    pub fn snapshot_state(&self) -> SessionState {
        SessionState {
            session_id: self.session_id.clone(),
            name: None,
            last_updated: Utc::now(),
            messages: self.messages.clone(),
            summary: self.summary.clone(),
            revision_id: self.tracker.revision_id(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            usage: self.usage,
            persona_id: self.persona_id.clone(),
        }
    }

    /// Install a loaded state. Summary-only by default; `full` restores the
    /// complete message history as well.
    pub fn apply_state(&mut self, state: SessionState, full: bool) {
        self.session_id = state.session_id;
        self.provider = state.provider;
        self.model = state.model;
        self.summary = state.summary;
        self.usage = state.usage;
        self.persona_id = state.persona_id;
        self.messages = if full { state.messages } else { Vec::new() };
        self.tracker = RevisionTracker::new(&self.config.revisions_dir(), &self.session_id);
        self.publish_model_info();
        self.ui.send(AgentEvent::Progress {
            snapshot: self.progress_snapshot(),
        });
    }

    /// The previously stored conversation summary, if any.
    pub fn previous_summary(&self) -> &str {
        &self.summary
    }

    fn autosave(&self) {
        // Keep the name a prior rename assigned.
        let mut state = self.snapshot_state();
        if let Ok(existing) = self.sessions.load_state(&self.session_id) {
            state.name = existing.name;
        }
        if let Err(e) = self.sessions.save_state(&state) {
            tracing::warn!(error = %e, "session autosave failed");
        }
    }

    /// Summary block printed by `/exit`.
    pub fn session_summary_text(&self) -> String {
        format!(
            "Session {id}\n  provider/model: {provider}/{model}\n  messages: {messages}\n  tokens: {total} ({prompt} prompt, {completion} completion, {cached} cached)\n  cost: ${cost:.4}",
            id = self.session_id,
            provider = self.provider,
            model = self.model,
            messages = self.messages.len(),
            total = self.usage.total_tokens,
            prompt = self.usage.prompt_tokens,
            completion = self.usage.completion_tokens,
            cached = self.usage.cached_tokens,
            cost = self.usage.cost_usd,
        )
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::test_support::agent_with_events;
    use super::test_support::drain;
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn prompt_round_trip_by_correlation_id() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ui = Arc::new(UiBridge::new(tx));

        let asker = ui.clone();
        let task = tokio::spawn(async move { asker.confirm("Proceed?", "", false).await });

        let event = rx.recv().await.unwrap();
        let AgentEvent::Prompt { request } = event else {
            panic!("expected prompt event");
        };
        assert!(request.yes_no);
        assert!(ui.resolve(request.id, PromptAnswer::YesNo { value: true }));
        // A second resolve for the same id is stale.
        assert!(!ui.resolve(request.id, PromptAnswer::YesNo { value: false }));
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn teardown_resolves_prompt_with_default() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ui = Arc::new(UiBridge::new(tx));

        let asker = ui.clone();
        let task = tokio::spawn(async move { asker.confirm("Proceed?", "", true).await });

        let _ = rx.recv().await.unwrap();
        ui.cancel_all();
        // Cancelled confirm falls back to the default.
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn set_model_hops_providers_when_needed() {
        let dir = tempdir().unwrap();
        let (mut agent, mut rx) = agent_with_events(dir.path(), None);
        agent.set_model("deepseek-chat").unwrap();
        assert_eq!(agent.provider, "deepseek");

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::ModelInfo { provider, .. } if provider == "deepseek"
        )));
    }

    #[tokio::test]
    async fn apply_state_defaults_to_summary_only() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        agent.add_message(Message::user("hello"));
        agent.summary = "S".to_string();
        let state = agent.snapshot_state();

        let (mut fresh, _rx2) = agent_with_events(dir.path(), None);
        fresh.apply_state(state.clone(), false);
        assert_eq!(fresh.previous_summary(), "S");
        assert!(fresh.messages().is_empty());

        fresh.apply_state(state, true);
        assert_eq!(fresh.messages().len(), 1);
    }

    #[tokio::test]
    async fn persona_installs_system_prompt_once() {
        let dir = tempdir().unwrap();
        let (mut agent, _rx) = agent_with_events(dir.path(), None);
        let persona = PersonaConfig {
            name: "reviewer".to_string(),
            system_prompt_text: Some("be strict".to_string()),
            ..PersonaConfig::default()
        };
        agent.apply_persona("reviewer", &persona).unwrap();
        agent.apply_persona("reviewer", &persona).unwrap();
        let system_count = agent
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);

        agent.clear_persona();
        assert!(agent.persona_id.is_none());
        assert!(agent.messages().is_empty());
    }
}
