//! Registry of model providers.
//!
//! Built-in defaults are compiled in so the assistant works out of the box;
//! each entry names the environment variable holding its API key. Local
//! providers (Ollama) need no key and render their cost as `FREE (local)`.

use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::LeditErr;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Friendly display name.
    pub name: String,
    /// Base URL for the provider's OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable that stores the user's API key.
    pub env_key: String,
    /// Local providers need no API key and are billed as free.
    #[serde(default)]
    pub local: bool,
}

impl ProviderInfo {
    /// The API key for this provider, if present in the environment.
    pub fn api_key(&self) -> Result<String> {
        if self.local {
            return Ok(String::new());
        }
        std::env::var(&self.env_key)
            .map_err(|_| LeditErr::Config(format!("{} is not set", self.env_key)))
    }
}

/// Built-in provider list.
pub fn built_in_providers() -> HashMap<String, ProviderInfo> {
    use ProviderInfo as P;

    [
        (
            "openai",
            P {
                name: "OpenAI".into(),
                base_url: "https://api.openai.com/v1".into(),
                env_key: "OPENAI_API_KEY".into(),
                local: false,
            },
        ),
        (
            "openrouter",
            P {
                name: "OpenRouter".into(),
                base_url: "https://openrouter.ai/api/v1".into(),
                env_key: "OPENROUTER_API_KEY".into(),
                local: false,
            },
        ),
        (
            "groq",
            P {
                name: "Groq".into(),
                base_url: "https://api.groq.com/openai/v1".into(),
                env_key: "GROQ_API_KEY".into(),
                local: false,
            },
        ),
        (
            "deepseek",
            P {
                name: "DeepSeek".into(),
                base_url: "https://api.deepseek.com".into(),
                env_key: "DEEPSEEK_API_KEY".into(),
                local: false,
            },
        ),
        (
            "ollama",
            P {
                name: "Ollama".into(),
                base_url: "http://localhost:11434/v1".into(),
                env_key: "OLLAMA_API_KEY".into(),
                local: true,
            },
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Look up a provider id, with a typed error naming the known ids.
pub fn resolve_provider(id: &str) -> Result<ProviderInfo> {
    built_in_providers().remove(id).ok_or_else(|| {
        let mut known: Vec<String> = built_in_providers().into_keys().collect();
        known.sort();
        LeditErr::Config(format!(
            "unknown provider: {id} (known: {})",
            known.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_is_local() {
        let providers = built_in_providers();
        assert!(providers["ollama"].local);
        assert!(!providers["openai"].local);
    }

    #[test]
    fn unknown_provider_lists_known_ids() {
        let err = resolve_provider("nope").err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("ollama")));
    }
}
