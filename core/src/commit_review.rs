//! Pre-commit review: model-driven when a client is available, heuristic
//! otherwise.
//!
//! The heuristic scans the raw staged diff (never the optimized one) for
//! secret keywords, risky filenames, leftover debug output and large
//! commented-out blocks. `--allow-secrets` suppresses the veto downstream,
//! not the generation here.

use std::sync::Arc;

use ledit_protocol::Message;

use crate::client::ModelClient;

pub const NO_CONCERNS: &str = "No critical concerns found.";

/// Lowercase substrings that flag a potential secret in diff content.
const SECRET_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "api_key",
    "apikey",
    "token",
    "private_key",
    "bearer",
    "authorization",
    "credential",
    "passwd",
    "pwd",
    "aws_access_key",
    "aws_secret_key",
    "slack_token",
    "github_token",
    "database_url",
];

/// Case-insensitive path fragments that flag a risky file.
const RISKY_FILE_PATTERNS: &[&str] = &[".env", "secret", "credential", "private_key", ".pem", ".key"];

/// Leftover debug output patterns, matched on the lowercased diff.
const DEBUG_PATTERNS: &[&str] = &["console.log", "fmt.println", "print(", "debug=true"];

/// Produce the review string for the staged set.
///
/// Model path first; any transport failure falls back to the heuristic so
/// a commit is never blocked on provider availability.
pub async fn generate_commit_review(
    client: Option<Arc<dyn ModelClient>>,
    model: &str,
    staged_files: &[String],
    optimized_diff: &str,
    raw_diff: &str,
) -> String {
    if let Some(client) = client {
        let prompt = format!(
            "Review the staged changes below before they are committed.\n\
             Respond with exactly \"{NO_CONCERNS}\" if nothing is critical.\n\
             Otherwise list the critical issues in 2-3 sentences, covering only:\n\
             secrets, security vulnerabilities, broken build, failing tests,\n\
             debug code, and files that should not be committed.\n\n\
             Files:\n{files}\n\nDiff:\n{optimized_diff}",
            files = staged_files.join("\n"),
        );
        match client.complete(model, &[Message::user(prompt)]).await {
            Ok(completion) if !completion.content.trim().is_empty() => {
                return completion.content.trim().to_string();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "review model unavailable, using heuristic");
            }
        }
    }
    heuristic_review(staged_files, raw_diff)
}

/// Keyword/path scan over the raw diff. Returns [`NO_CONCERNS`] only when
/// every category comes back clean.
pub fn heuristic_review(staged_files: &[String], raw_diff: &str) -> String {
    let lower_diff = raw_diff.to_lowercase();
    let mut flags: Vec<String> = Vec::new();

    if let Some(keyword) = SECRET_KEYWORDS.iter().find(|k| lower_diff.contains(*k)) {
        flags.push(format!("POTENTIAL SECRET EXPOSED: diff mentions `{keyword}`"));
    }

    for path in staged_files {
        let lower_path = path.to_lowercase();
        if let Some(pattern) = RISKY_FILE_PATTERNS.iter().find(|p| lower_path.contains(*p)) {
            flags.push(format!("RISKY FILE: {path} matches `{pattern}`"));
            break;
        }
    }

    if let Some(pattern) = DEBUG_PATTERNS.iter().find(|p| lower_diff.contains(*p)) {
        flags.push(format!("DEBUG CODE: diff contains `{pattern}`"));
    }

    let line_comments = raw_diff.matches("//").count();
    if raw_diff.contains("//") && raw_diff.contains("/*") && line_comments > 10 {
        flags.push("LARGE COMMENTED CODE BLOCKS".to_string());
    }

    if flags.is_empty() {
        NO_CONCERNS.to_string()
    } else {
        flags.join("\n")
    }
}

/// True when the review allows committing without an override.
pub fn review_is_clean(review: &str) -> bool {
    review.trim() == NO_CONCERNS
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::client::testing::ScriptedClient;
    use pretty_assertions::assert_eq;

    #[test]
    fn secret_keyword_flags_first() {
        let review = heuristic_review(
            &["config.rs".to_string()],
            "+api_key = \"sk-abc\"\n+debug=true\n",
        );
        assert!(review.starts_with("POTENTIAL SECRET EXPOSED"), "{review}");
        assert_ne!(review, NO_CONCERNS);
    }

    #[test]
    fn every_secret_keyword_is_caught() {
        for keyword in SECRET_KEYWORDS {
            let diff = format!("+{keyword} = \"value\"\n");
            let review = heuristic_review(&[], &diff);
            assert_ne!(review, NO_CONCERNS, "missed keyword {keyword}");
        }
    }

    #[test]
    fn risky_files_are_flagged_case_insensitively() {
        let review = heuristic_review(&["deploy/PRIVATE_KEY.txt".to_string()], "+x\n");
        assert!(review.contains("RISKY FILE"), "{review}");

        let review = heuristic_review(&["src/main.rs".to_string()], "+x\n");
        assert_eq!(review, NO_CONCERNS);
    }

    #[test]
    fn debug_patterns_are_flagged() {
        let review = heuristic_review(&[], "+console.log('here')\n");
        assert!(review.contains("DEBUG CODE"), "{review}");
    }

    #[test]
    fn large_commented_blocks_are_flagged() {
        let mut diff = String::from("+/* old implementation\n");
        for i in 0..12 {
            diff.push_str(&format!("+// line {i}\n"));
        }
        let review = heuristic_review(&[], &diff);
        assert!(review.contains("LARGE COMMENTED CODE BLOCKS"), "{review}");
    }

    #[test]
    fn clean_diff_has_no_concerns() {
        assert_eq!(
            heuristic_review(&["src/lib.rs".to_string()], "+fn a() {}\n"),
            NO_CONCERNS
        );
        assert!(review_is_clean(NO_CONCERNS));
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_heuristic() {
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::failing());
        let review = generate_commit_review(
            Some(client),
            "gpt-5",
            &["a.rs".to_string()],
            "+x",
            "+password = \"hunter2\"\n",
        )
        .await;
        assert!(review.starts_with("POTENTIAL SECRET EXPOSED"), "{review}");
    }

    #[tokio::test]
    async fn model_review_is_used_when_available() {
        let client: Arc<dyn ModelClient> =
            Arc::new(ScriptedClient::new(vec!["No critical concerns found."]));
        let review =
            generate_commit_review(Some(client), "gpt-5", &[], "+x", "+password = 1\n").await;
        assert!(review_is_clean(&review));
    }
}
