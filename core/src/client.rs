//! The LLM interface the core consumes.
//!
//! Provider wire clients are external collaborators; the core only depends
//! on [`ModelClient`]. The bundled [`ChatCompletionsClient`] speaks the
//! OpenAI-compatible `/chat/completions` shape, which every built-in
//! provider exposes.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use ledit_protocol::Message;
use ledit_protocol::Role;
use ledit_protocol::TokenUsage;

use crate::error::LeditErr;
use crate::error::Result;
use crate::providers::ProviderInfo;

#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One blocking round-trip: full message history in, assistant text out.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<Completion>;
}

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(provider: &ProviderInfo) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key()?,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<Completion> {
        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: wire_role(m.role),
                    content: &m.content,
                })
                .collect(),
        };

        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LeditErr::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeditErr::Transport(format!(
                "provider returned {status}: {}",
                body.chars().take(400).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LeditErr::Transport(format!("malformed response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LeditErr::Transport("response contained no choices".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Completion {
            content: choice.message.content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                cached_tokens: 0,
                total_tokens: usage.total_tokens,
                cost_usd: 0.0,
            },
        })
    }
}
