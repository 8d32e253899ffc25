//! File-path auto-referencing for free-text input.
//!
//! Before a query is dispatched to the agent, whitespace-separated tokens
//! that resolve to regular files are collected into a trailing
//! `Referenced files:` section so the model sees which paths the operator
//! meant. Existence checks go through [`std::path::Path`]; no separator
//! string heuristics.

use std::path::Path;

/// Extensions that mark a bare token (no separator) as a file candidate.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "go", "py", "js", "jsx", "ts", "tsx", "java", "c", "h", "cpp", "hpp", "cc", "rb", "sh",
    "toml", "yaml", "yml", "json", "md", "txt", "sql", "html", "css",
];

/// Append a `Referenced files:` section listing each existing file
/// mentioned in `text`. Returns the input unchanged when nothing matches.
pub(crate) fn append_file_references(text: &str, cwd: &Path) -> String {
    let mut found: Vec<String> = Vec::new();
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| matches!(c, ',' | ';' | ')' | '(' | '"' | '\''));
        if token.is_empty() || found.iter().any(|f| f == token) {
            continue;
        }
        let path = Path::new(token);
        let has_separator = path.components().count() > 1;
        let has_source_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !has_separator && !has_source_ext {
            continue;
        }
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        if resolved.is_file() {
            found.push(token.to_string());
        }
    }

    if found.is_empty() {
        return text.to_string();
    }
    let mut out = String::from(text);
    out.push_str("\n\nReferenced files:\n");
    for file in found {
        out.push_str(&format!("#{file}\n"));
    }
    out.trim_end().to_string()
}
