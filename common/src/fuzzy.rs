/// Scoring for interactive model selection.
///
/// Higher is better. The weights are fixed so selection behaves the same in
/// the dropdown and the plain-stdin fallback:
///
/// * exact substring hit in the id: 100, plus 50 when it is a prefix
/// * `provider/model` query: both halves must substring-match their side,
///   worth 80 on top of any id hit
/// * each whitespace-separated query word found in the id: 30
/// * each query word found in the description: 10
///
/// Returns `None` when nothing matches at all.
pub fn fuzzy_score(id: &str, description: &str, query: &str) -> Option<i64> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let id_lower = id.to_lowercase();
    let desc_lower = description.to_lowercase();
    let query_lower = query.to_lowercase();

    let mut score: i64 = 0;

    if id_lower.contains(&query_lower) {
        score += 100;
        if id_lower.starts_with(&query_lower) {
            score += 50;
        }
    }

    if let Some((provider_part, model_part)) = query_lower.split_once('/') {
        let (id_provider, id_model) = id_lower.split_once('/').unwrap_or(("", &id_lower));
        if !provider_part.is_empty()
            && !model_part.is_empty()
            && id_provider.contains(provider_part)
            && id_model.contains(model_part)
        {
            score += 80;
        }
    }

    for word in query_lower.split_whitespace() {
        if id_lower.contains(word) {
            score += 30;
        }
        if desc_lower.contains(word) {
            score += 10;
        }
    }

    if score == 0 { None } else { Some(score) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_substring_beats_word_hit() {
        let exact = fuzzy_score("gpt-5-mini", "fast model", "gpt-5");
        let word = fuzzy_score("o4", "a gpt-5 class model", "gpt-5");
        assert!(exact > word);
    }

    #[test]
    fn prefix_gets_the_bonus() {
        // Both ids contain the query; only one starts with it.
        let prefix = fuzzy_score("llama-3-70b", "", "llama").unwrap();
        let infix = fuzzy_score("meta/llama-3-70b", "", "llama").unwrap();
        assert_eq!(prefix - infix, 50);
    }

    #[test]
    fn provider_slash_model_requires_both_halves() {
        assert!(fuzzy_score("openai/gpt-5", "", "openai/gpt").unwrap() >= 180);
        // Provider half does not match: no slash bonus, no substring hit.
        assert_eq!(fuzzy_score("groq/llama-3", "", "openai/llama"), None);
    }

    #[test]
    fn description_words_score_low() {
        assert_eq!(fuzzy_score("m1", "supports tools and vision", "tools"), Some(10));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(fuzzy_score("gpt-5", "flagship", "claude"), None);
        assert_eq!(fuzzy_score("gpt-5", "flagship", "   "), None);
    }
}
