//! Project-context generation for `/init`.
//!
//! Walks the repository, detects entrypoints, test and build files and the
//! language toolchain, and writes a single Markdown summary to
//! `./.project_context.md`. The output is deliberately descriptive; the one
//! hard guarantee is an idempotent overwrite of the target file.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Result;

pub const OUTPUT_FILENAME: &str = ".project_context.md";

const SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    "target",
    "node_modules",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
    ".idea",
    ".vscode",
];

const ENTRYPOINT_NAMES: &[&str] = &[
    "main.rs", "main.go", "main.py", "app.py", "index.js", "index.ts", "main.c", "main.cpp",
    "Main.java",
];

const BUILD_FILES: &[&str] = &[
    "Cargo.toml",
    "go.mod",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "Makefile",
    "CMakeLists.txt",
    "build.gradle",
    "pom.xml",
];

const TOOLCHAIN_FILES: &[&str] = &[
    "rust-toolchain.toml",
    "rust-toolchain",
    ".nvmrc",
    ".python-version",
    ".go-version",
    ".tool-versions",
];

/// Files whose overview prose is worth reusing, in preference order.
const OVERVIEW_SOURCES: &[&str] = &["CLAUDE.md", "AGENTS.md", "README.md", "README"];

#[derive(Debug, Default)]
struct Survey {
    entrypoints: Vec<PathBuf>,
    build_files: Vec<PathBuf>,
    test_paths: Vec<PathBuf>,
    toolchain: Vec<String>,
    file_count: usize,
    languages: Vec<(String, usize)>,
}

/// Generate the context document and write it to `cwd/.project_context.md`.
/// Returns the path written.
pub fn generate(cwd: &Path) -> Result<PathBuf> {
    let mut survey = Survey::default();
    walk(cwd, cwd, 0, &mut survey)?;

    survey.entrypoints.sort();
    survey.build_files.sort();
    survey.test_paths.sort();
    survey.test_paths.truncate(20);
    survey.languages.sort_by(|a, b| b.1.cmp(&a.1));

    let overview = find_overview(cwd);
    let document = render(cwd, &survey, overview.as_deref());

    let target = cwd.join(OUTPUT_FILENAME);
    fs::write(&target, document)?;
    Ok(target)
}

fn walk(root: &Path, dir: &Path, depth: usize, survey: &mut Survey) -> Result<()> {
    if depth > 6 {
        return Ok(());
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() {
            if SKIP_DIRS.contains(&name) {
                continue;
            }
            if name == "tests" || name == "test" || name == "spec" {
                survey.test_paths.push(rel(root, &path));
            }
            walk(root, &path, depth + 1, survey)?;
            continue;
        }

        survey.file_count += 1;
        if ENTRYPOINT_NAMES.contains(&name) {
            survey.entrypoints.push(rel(root, &path));
        }
        if BUILD_FILES.contains(&name) {
            survey.build_files.push(rel(root, &path));
        }
        if TOOLCHAIN_FILES.contains(&name) {
            if let Ok(raw) = fs::read_to_string(&path) {
                let version = raw.lines().next().unwrap_or("").trim();
                if !version.is_empty() {
                    survey.toolchain.push(format!("{name}: {version}"));
                }
            }
        }
        if name.ends_with("_test.go")
            || name.ends_with(".test.js")
            || name.ends_with(".test.ts")
            || name.ends_with("_test.py")
        {
            survey.test_paths.push(rel(root, &path));
        }
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let lang = match ext {
                "rs" => Some("Rust"),
                "go" => Some("Go"),
                "py" => Some("Python"),
                "js" | "jsx" => Some("JavaScript"),
                "ts" | "tsx" => Some("TypeScript"),
                "java" => Some("Java"),
                "c" | "h" => Some("C"),
                "cpp" | "cc" | "hpp" => Some("C++"),
                "rb" => Some("Ruby"),
                _ => None,
            };
            if let Some(lang) = lang {
                match survey.languages.iter_mut().find(|(l, _)| l == lang) {
                    Some((_, count)) => *count += 1,
                    None => survey.languages.push((lang.to_string(), 1)),
                }
            }
        }
    }
    Ok(())
}

fn rel(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// First prose paragraph of the first overview file present.
fn find_overview(cwd: &Path) -> Option<String> {
    for name in OVERVIEW_SOURCES {
        let Ok(raw) = fs::read_to_string(cwd.join(name)) else {
            continue;
        };
        let paragraph = raw
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty() && !p.starts_with('#') && !p.starts_with("!["));
        if let Some(paragraph) = paragraph {
            return Some(format!("{paragraph}\n\n_(from {name})_"));
        }
    }
    None
}

fn render(cwd: &Path, survey: &Survey, overview: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("# Project Context\n\n");
    out.push_str(&format!(
        "Root: `{}` — {} files surveyed.\n\n",
        cwd.display(),
        survey.file_count
    ));

    if let Some(overview) = overview {
        out.push_str("## Overview\n\n");
        out.push_str(overview);
        out.push_str("\n\n");
    }

    if !survey.languages.is_empty() {
        out.push_str("## Languages\n\n");
        for (lang, count) in &survey.languages {
            out.push_str(&format!("- {lang}: {count} files\n"));
        }
        out.push('\n');
    }

    if !survey.entrypoints.is_empty() {
        out.push_str("## Entrypoints\n\n");
        for path in &survey.entrypoints {
            out.push_str(&format!("- `{}`\n", path.display()));
        }
        out.push('\n');
    }

    out.push_str("## Build system\n\n");
    if survey.build_files.is_empty() {
        out.push_str("No recognized build files.\n\n");
    } else {
        for path in &survey.build_files {
            out.push_str(&format!("- `{}`\n", path.display()));
        }
        out.push('\n');
        out.push_str(&dependency_dump(cwd, &survey.build_files));
    }

    out.push_str("## Testing\n\n");
    if survey.test_paths.is_empty() {
        out.push_str("No test files or directories detected.\n\n");
    } else {
        for path in &survey.test_paths {
            out.push_str(&format!("- `{}`\n", path.display()));
        }
        out.push('\n');
    }

    if !survey.toolchain.is_empty() {
        out.push_str("## Toolchain\n\n");
        for line in &survey.toolchain {
            out.push_str(&format!("- {line}\n"));
        }
        out.push('\n');
    }

    out
}

/// Verbatim dependency sections from the first recognized manifest.
fn dependency_dump(cwd: &Path, build_files: &[PathBuf]) -> String {
    for file in build_files {
        let path = cwd.join(file);
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(raw) = fs::read_to_string(&path) else {
            continue;
        };
        let section = match name {
            "Cargo.toml" => extract_toml_section(&raw, "[dependencies]"),
            "package.json" => extract_json_object(&raw, "\"dependencies\""),
            "go.mod" => extract_go_requires(&raw),
            _ => None,
        };
        if let Some(section) = section {
            return format!(
                "### Dependencies (`{}`)\n\n```\n{}\n```\n\n",
                file.display(),
                section.trim_end()
            );
        }
    }
    String::new()
}

fn extract_toml_section(raw: &str, header: &str) -> Option<String> {
    let start = raw.find(header)?;
    let body = &raw[start + header.len()..];
    let end = body.find("\n[").unwrap_or(body.len());
    let section = body[..end].trim();
    if section.is_empty() {
        None
    } else {
        Some(section.to_string())
    }
}

fn extract_json_object(raw: &str, key: &str) -> Option<String> {
    let start = raw.find(key)?;
    let open = raw[start..].find('{')? + start;
    let close = raw[open..].find('}')? + open;
    Some(raw[open + 1..close].trim().to_string())
}

fn extract_go_requires(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .filter(|l| l.trim_start().starts_with("require") || l.trim_start().starts_with('\t'))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generates_and_overwrites_idempotently() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\n\n[dependencies]\nserde = \"1\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("README.md"),
            "# demo\n\nA sample project for testing.\n",
        )
        .unwrap();

        let target = generate(dir.path()).unwrap();
        let first = fs::read_to_string(&target).unwrap();
        assert!(first.contains("src/main.rs"));
        assert!(first.contains("serde = \"1\""));
        assert!(first.contains("A sample project for testing."));

        let second = fs::read_to_string(generate(dir.path()).unwrap()).unwrap();
        // The survey now includes the generated file itself, so only the
        // counts may differ between runs; sections stay stable.
        assert_eq!(
            first.lines().filter(|l| l.starts_with('#')).count(),
            second.lines().filter(|l| l.starts_with('#')).count()
        );
    }

    #[test]
    fn skips_vendor_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(dir.path().join("index.js"), "x").unwrap();

        generate(dir.path()).unwrap();
        let doc = fs::read_to_string(dir.path().join(OUTPUT_FILENAME)).unwrap();
        assert!(doc.contains("JavaScript: 1 files"));
    }
}
