//! Model catalog, featured subsets and interactive selection scoring.

use ledit_common::fuzzy::fuzzy_score;

use crate::providers::ProviderInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Catalog id; for aggregators this is `provider/model`.
    pub id: String,
    pub description: String,
    pub context_length: u32,
    /// Cost per million input tokens, USD.
    pub input_cost_per_m: Option<f64>,
    /// Cost per million output tokens, USD.
    pub output_cost_per_m: Option<f64>,
    /// Legacy unified cost for catalogs that do not split input/output.
    pub unified_cost_per_m: Option<f64>,
    pub features: Vec<&'static str>,
}

impl ModelInfo {
    fn new(id: &str, description: &str, context_length: u32) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            context_length,
            input_cost_per_m: None,
            output_cost_per_m: None,
            unified_cost_per_m: None,
            features: Vec::new(),
        }
    }

    fn cost(mut self, input: f64, output: f64) -> Self {
        self.input_cost_per_m = Some(input);
        self.output_cost_per_m = Some(output);
        self
    }

    fn unified(mut self, cost: f64) -> Self {
        self.unified_cost_per_m = Some(cost);
        self
    }

    fn features(mut self, features: &[&'static str]) -> Self {
        self.features = features.to_vec();
        self
    }
}

/// Curated, provider-specific allowlist surfaced preferentially in selection
/// UIs.
pub fn featured_models(provider_id: &str) -> &'static [&'static str] {
    match provider_id {
        "openai" => &["gpt-5", "gpt-5-mini", "o4-mini"],
        "openrouter" => &["anthropic/claude-sonnet-4", "openai/gpt-5"],
        "groq" => &["llama-3.3-70b-versatile"],
        "deepseek" => &["deepseek-chat"],
        "ollama" => &["qwen2.5-coder", "llama3.2"],
        _ => &[],
    }
}

/// Catalog for a provider, sorted by id.
pub fn models_for_provider(provider_id: &str) -> Vec<ModelInfo> {
    let mut models = match provider_id {
        "openai" => vec![
            ModelInfo::new("gpt-5", "Flagship general coding model", 400_000)
                .cost(1.25, 10.0)
                .features(&["tools", "tool_choice", "vision", "streaming"]),
            ModelInfo::new("gpt-5-mini", "Fast, cheaper tier of gpt-5", 400_000)
                .cost(0.25, 2.0)
                .features(&["tools", "tool_choice", "streaming"]),
            ModelInfo::new("o4-mini", "Compact reasoning model", 200_000)
                .cost(1.1, 4.4)
                .features(&["tools", "streaming"]),
        ],
        "openrouter" => vec![
            ModelInfo::new(
                "anthropic/claude-sonnet-4",
                "Strong coding and agentic model",
                200_000,
            )
            .cost(3.0, 15.0)
            .features(&["tools", "tool_choice", "streaming"]),
            ModelInfo::new("openai/gpt-5", "Flagship routed through OpenRouter", 400_000)
                .cost(1.25, 10.0)
                .features(&["tools", "tool_choice", "streaming"]),
            ModelInfo::new("qwen/qwen3-coder", "Open-weight coding model", 262_144)
                .unified(0.9)
                .features(&["tools", "streaming"]),
        ],
        "groq" => vec![
            ModelInfo::new("llama-3.3-70b-versatile", "Fast hosted Llama", 131_072)
                .cost(0.59, 0.79)
                .features(&["tools", "streaming"]),
            ModelInfo::new("llama-3.1-8b-instant", "Cheapest instant tier", 131_072)
                .cost(0.05, 0.08)
                .features(&["streaming"]),
        ],
        "deepseek" => vec![
            ModelInfo::new("deepseek-chat", "General chat/coding model", 128_000)
                .cost(0.27, 1.1)
                .features(&["tools", "streaming"]),
            ModelInfo::new("deepseek-reasoner", "Reasoning-first model", 128_000)
                .cost(0.55, 2.19)
                .features(&["streaming"]),
        ],
        "ollama" => vec![
            ModelInfo::new("qwen2.5-coder", "Local coding model", 32_768)
                .features(&["tools", "streaming"]),
            ModelInfo::new("llama3.2", "Small local general model", 131_072)
                .features(&["streaming"]),
        ],
        _ => Vec::new(),
    };
    models.sort_by(|a, b| a.id.cmp(&b.id));
    models
}

/// Render the cost column: split input/output costs, a legacy unified cost,
/// or `FREE (local)` for local providers.
pub fn format_cost(model: &ModelInfo, provider: &ProviderInfo) -> String {
    if provider.local {
        return "FREE (local)".to_string();
    }
    match (
        model.input_cost_per_m,
        model.output_cost_per_m,
        model.unified_cost_per_m,
    ) {
        (Some(input), Some(output), _) => {
            format!("${input:.2}/M in, ${output:.2}/M out")
        }
        (_, _, Some(unified)) => format!("${unified:.2}/M"),
        _ => "unpriced".to_string(),
    }
}

/// Dollar cost of one usage sample under the given model's pricing. Local
/// and unpriced models cost nothing.
pub fn cost_for_usage(
    provider: &ProviderInfo,
    model: &ModelInfo,
    usage: &ledit_protocol::TokenUsage,
) -> f64 {
    if provider.local {
        return 0.0;
    }
    match (
        model.input_cost_per_m,
        model.output_cost_per_m,
        model.unified_cost_per_m,
    ) {
        (Some(input), Some(output), _) => {
            (usage.prompt_tokens as f64 * input + usage.completion_tokens as f64 * output)
                / 1_000_000.0
        }
        (_, _, Some(unified)) => usage.total_tokens as f64 * unified / 1_000_000.0,
        _ => 0.0,
    }
}

/// Rank the provider's catalog against `query`, best first, top 10.
pub fn rank_models(provider_id: &str, query: &str) -> Vec<(ModelInfo, i64)> {
    let mut scored: Vec<(ModelInfo, i64)> = models_for_provider(provider_id)
        .into_iter()
        .filter_map(|m| fuzzy_score(&m.id, &m.description, query).map(|s| (m, s)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
    scored.truncate(10);
    scored
}

/// Exact-id resolution used by the non-terminal selection variant.
pub fn find_model(provider_id: &str, model_id: &str) -> Option<ModelInfo> {
    models_for_provider(provider_id)
        .into_iter()
        .find(|m| m.id == model_id)
}

/// Search every provider for a model id; used when `/models <id>` names a
/// model the active provider does not have, so the agent can switch
/// providers automatically.
pub fn find_model_anywhere(model_id: &str) -> Option<(String, ModelInfo)> {
    for provider_id in ["openai", "openrouter", "groq", "deepseek", "ollama"] {
        if let Some(model) = find_model(provider_id, model_id) {
            return Some((provider_id.to_string(), model));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::providers::built_in_providers;
    use pretty_assertions::assert_eq;

    #[test]
    fn catalogs_are_sorted_by_id() {
        for provider in ["openai", "openrouter", "groq", "deepseek", "ollama"] {
            let models = models_for_provider(provider);
            let mut sorted = models.clone();
            sorted.sort_by(|a, b| a.id.cmp(&b.id));
            assert_eq!(models, sorted, "{provider} catalog out of order");
        }
    }

    #[test]
    fn featured_models_exist_in_catalog() {
        for provider in ["openai", "openrouter", "groq", "deepseek", "ollama"] {
            for id in featured_models(provider) {
                assert!(
                    find_model(provider, id).is_some(),
                    "featured {id} missing from {provider}"
                );
            }
        }
    }

    #[test]
    fn local_provider_is_free() {
        let providers = built_in_providers();
        let model = find_model("ollama", "llama3.2").unwrap();
        assert_eq!(format_cost(&model, &providers["ollama"]), "FREE (local)");
    }

    #[test]
    fn unified_cost_renders_when_split_missing() {
        let providers = built_in_providers();
        let model = find_model("openrouter", "qwen/qwen3-coder").unwrap();
        assert_eq!(format_cost(&model, &providers["openrouter"]), "$0.90/M");
    }

    #[test]
    fn ranking_prefers_exact_prefix() {
        let ranked = rank_models("openai", "gpt-5");
        assert_eq!(ranked[0].0.id, "gpt-5");
        assert!(ranked.len() >= 2);
    }

    #[test]
    fn provider_slash_model_query_matches_aggregator_ids() {
        let ranked = rank_models("openrouter", "anthropic/claude");
        assert_eq!(ranked[0].0.id, "anthropic/claude-sonnet-4");
    }

    #[test]
    fn cross_provider_lookup_switches_provider() {
        let (provider, model) = find_model_anywhere("deepseek-chat").unwrap();
        assert_eq!(provider, "deepseek");
        assert_eq!(model.id, "deepseek-chat");
    }
}
