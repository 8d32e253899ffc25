//! The git commit workflow.
//!
//! Eight stages, each a hard boundary: discover staged state, classify the
//! file actions, optimize the diff, run the pre-commit review, generate a
//! title, generate a body, compose and confirm with the operator, then
//! apply (or report, in dry-run and JSON modes). A failure in one stage
//! never advances to the next.

use std::path::Path;

use ledit_protocol::CommitJsonResult;
use ledit_protocol::CommitStatus;
use ledit_protocol::Message;

use crate::agent::Agent;
use crate::commit_review::generate_commit_review;
use crate::commit_review::review_is_clean;
use crate::error::LeditErr;
use crate::error::Result;
use crate::git;

/// Branches that do not get a `[<branch>] ` title prefix.
const DEFAULT_BRANCHES: &[&str] = &["master", "main", "develop", "dev"];

const TITLE_WIDTH: usize = 72;
const BODY_WIDTH: usize = 72;
const BODY_MAX_CHARS: usize = 500;

pub const DRY_RUN_MESSAGE: &str =
    "Dry-run mode: commit message generated successfully without creating commit";

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    pub skip_prompt: bool,
    pub dry_run: bool,
    pub allow_secrets: bool,
}

/// Scratch state built up while the workflow runs; lives for exactly one
/// invocation.
#[derive(Debug, Default)]
struct CommitDraft {
    branch: String,
    is_default_branch: bool,
    staged_files: Vec<String>,
    file_actions: Vec<(String, String)>,
    primary_action: String,
    diff_optimized: String,
    diff_raw: String,
    captions: Vec<(String, String)>,
    title: String,
    body: String,
    review: String,
}

impl CommitDraft {
    fn title_prefix(&self) -> String {
        if self.is_default_branch {
            String::new()
        } else {
            format!("[{}] ", self.branch)
        }
    }

    /// `"<Action> <path>"` for a single file, `"<PrimaryAction> N files"`
    /// otherwise.
    fn actions_summary(&self) -> String {
        match self.file_actions.as_slice() {
            [(action, path)] => format!("{action} {path}"),
            actions => format!("{} {} files", self.primary_action, actions.len()),
        }
    }

    fn title_budget(&self) -> usize {
        TITLE_WIDTH
            .saturating_sub(self.title_prefix().len())
            .saturating_sub(self.actions_summary().len())
            .saturating_sub(" - ".len())
    }

    fn compose(&self) -> String {
        let wrapped = ledit_common::wrap::wrap_text(&self.body, BODY_WIDTH);
        format!(
            "{}{} - {}\n\n{}",
            self.title_prefix(),
            self.actions_summary(),
            self.title,
            wrapped
        )
    }
}

fn action_for_status(status: &str) -> String {
    match status.chars().next() {
        Some('A') => "Adds",
        Some('D') => "Deletes",
        Some('R') => "Renames",
        _ => "Updates",
    }
    .to_string()
}

/// Run the workflow. The returned [`CommitJsonResult`] is already
/// validated; interactive callers render its fields, JSON callers emit it
/// verbatim.
pub async fn run_commit(agent: &mut Agent, options: CommitOptions) -> Result<CommitJsonResult> {
    let cwd = agent.config.cwd.clone();
    if !git::is_git_repo(&cwd).await {
        return Err(LeditErr::Usage("not inside a git repository".to_string()));
    }

    // Stage 1: discover state.
    let mut draft = CommitDraft {
        branch: git::current_branch(&cwd).await?,
        ..CommitDraft::default()
    };
    draft.is_default_branch = DEFAULT_BRANCHES.contains(&draft.branch.as_str());
    draft.staged_files = git::staged_files(&cwd).await?;

    if draft.staged_files.is_empty() {
        let interactive = agent.config.agent_console && !options.skip_prompt;
        if interactive {
            stage_interactively(agent, &cwd).await?;
            draft.staged_files = git::staged_files(&cwd).await?;
        }
        if draft.staged_files.is_empty() {
            agent.ui.log("✅ Nothing to commit.");
            return finish(CommitJsonResult {
                status: CommitStatus::Success,
                commit: Some("HEAD".to_string()),
                message: Some("Nothing to commit".to_string()),
                branch: Some(draft.branch),
                error: None,
                review: None,
            });
        }
    }

    // Stage 2: classify.
    draft.file_actions = git::staged_name_status(&cwd)
        .await?
        .into_iter()
        .map(|(status, path)| (action_for_status(&status), path))
        .collect();
    draft.primary_action = draft
        .file_actions
        .first()
        .map(|(action, _)| action.clone())
        .unwrap_or_else(|| "Updates".to_string());

    // Stage 3: optimize the diff. The raw diff stays for the heuristics.
    draft.diff_raw = git::staged_diff(&cwd).await?;
    let optimized = agent.diff_optimizer.optimize(&draft.diff_raw);
    draft.diff_optimized = optimized.content;
    draft.captions = optimized.file_summaries;

    // Stage 4: pre-commit review, model first, heuristic fallback.
    draft.review = generate_commit_review(
        agent.client.clone(),
        &agent.model,
        &draft.staged_files,
        &draft.diff_optimized,
        &draft.diff_raw,
    )
    .await;
    if !review_is_clean(&draft.review) {
        agent.ui.log(format!("⚠️ Pre-commit review:\n{}", draft.review));
        if !options.allow_secrets {
            return Err(LeditErr::Usage(format!(
                "commit blocked by pre-commit review (use --allow-secrets to override):\n{}",
                draft.review
            )));
        }
    }

    // Stages 5-7: generate, compose, confirm; Retry loops back here.
    loop {
        generate_title(agent, &mut draft).await?;
        generate_body(agent, &mut draft).await?;
        let message = draft.compose();

        match confirm_message(agent, &message, options).await? {
            Confirmation::Approve(final_message) => {
                // Stage 8: apply or report.
                if options.dry_run {
                    agent.ui.log(format!("📝 Commit message:\n{final_message}"));
                    return finish(CommitJsonResult {
                        status: CommitStatus::DryRun,
                        commit: None,
                        message: Some(DRY_RUN_MESSAGE.to_string()),
                        branch: Some(draft.branch.clone()),
                        error: None,
                        review: Some(draft.review.clone()),
                    });
                }
                let output = git::commit_with_message(&cwd, &final_message).await?;
                agent.ui.log(format!("✅ {}", output.trim_end()));
                let commit = git::head_hash(&cwd).await?;
                let branch = git::current_branch(&cwd).await?;
                return finish(CommitJsonResult {
                    status: CommitStatus::Success,
                    commit: Some(commit),
                    message: Some(final_message),
                    branch: Some(branch),
                    error: None,
                    review: Some(draft.review.clone()),
                });
            }
            Confirmation::Retry => continue,
            Confirmation::Cancel => {
                agent.ui.log("🔄 Commit cancelled.");
                return Err(LeditErr::Interrupted);
            }
        }
    }
}

/// Offer the unstaged changes for selection and stage the chosen paths.
async fn stage_interactively(agent: &mut Agent, cwd: &Path) -> Result<()> {
    let status = git::porcelain_status(cwd).await?;
    let candidates: Vec<String> = status.into_iter().map(|(_, path)| path).collect();
    if candidates.is_empty() {
        return Ok(());
    }

    let listing = candidates
        .iter()
        .enumerate()
        .map(|(i, path)| format!("{}. {path}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let Some(answer) = agent
        .ui
        .ask(
            "Stage which files? (numbers, 'all', or empty to cancel)",
            listing,
        )
        .await
    else {
        return Ok(());
    };

    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return Ok(());
    }
    let selected: Vec<String> = if answer == "all" || answer == "a" {
        candidates
    } else {
        answer
            .split([' ', ','])
            .filter_map(|token| token.trim().parse::<usize>().ok())
            .filter_map(|index| candidates.get(index.checked_sub(1)?).cloned())
            .collect()
    };
    git::stage_files(cwd, &selected).await
}

async fn generate_title(agent: &mut Agent, draft: &mut CommitDraft) -> Result<()> {
    let client = agent
        .client
        .clone()
        .ok_or_else(|| LeditErr::Transport("commit title generation needs a model client".to_string()))?;

    let budget = draft.title_budget();
    let prompt = format!(
        "Write a one-line git commit title for the staged changes.\n\
         Start with the word \"{action}\". Use at most {budget} characters.\n\
         No colons, no markdown, no quotes; output the title only.\n\n\
         {captions}Diff:\n{diff}",
        action = draft.primary_action,
        captions = render_captions(&draft.captions),
        diff = draft.diff_optimized,
    );
    let completion = client.complete(&agent.model, &[Message::user(prompt)]).await?;
    draft.title = sanitize_title(&completion.content, budget);
    if draft.title.is_empty() {
        return Err(LeditErr::Transport("model returned an empty title".to_string()));
    }
    Ok(())
}

async fn generate_body(agent: &mut Agent, draft: &mut CommitDraft) -> Result<()> {
    let client = agent
        .client
        .clone()
        .ok_or_else(|| LeditErr::Transport("commit body generation needs a model client".to_string()))?;

    let prompt = format!(
        "Write the body for a git commit message describing the staged\n\
         changes: a single paragraph of at most {BODY_MAX_CHARS} characters.\n\
         Do not repeat the title, do not use code fences, do not list\n\
         filenames.\n\n{captions}Diff:\n{diff}",
        captions = render_captions(&draft.captions),
        diff = draft.diff_optimized,
    );
    let completion = client.complete(&agent.model, &[Message::user(prompt)]).await?;
    let mut body = completion.content.trim().replace("```", "");
    if body.chars().count() > BODY_MAX_CHARS {
        body = body.chars().take(BODY_MAX_CHARS).collect();
    }
    draft.body = body;
    Ok(())
}

fn render_captions(captions: &[(String, String)]) -> String {
    if captions.is_empty() {
        return String::new();
    }
    let mut out = String::from("File summaries:\n");
    for (path, caption) in captions {
        out.push_str(&format!("  {path}: {caption}\n"));
    }
    out.push('\n');
    out
}

/// First line only, markdown and colons stripped, clamped to the budget.
fn sanitize_title(raw: &str, budget: usize) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let cleaned: String = line
        .trim()
        .trim_matches('`')
        .trim_matches('"')
        .chars()
        .filter(|c| *c != ':' && *c != '`')
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.chars().count() > budget {
        cleaned.chars().take(budget).collect::<String>().trim_end().to_string()
    } else {
        cleaned
    }
}

enum Confirmation {
    Approve(String),
    Retry,
    Cancel,
}

/// Present the composed message. `--skip-prompt` auto-approves; the TUI
/// branch uses the modal prompt channel; the plain branch reads stdin.
/// Unknown responses re-prompt.
async fn confirm_message(
    agent: &mut Agent,
    message: &str,
    options: CommitOptions,
) -> Result<Confirmation> {
    if options.skip_prompt || agent.config.skip_prompt {
        return Ok(Confirmation::Approve(message.to_string()));
    }

    loop {
        let answer = if agent.config.agent_console {
            agent
                .ui
                .ask(
                    "Commit with this message? [y]es / [n]o / [e]dit / [r]etry",
                    message,
                )
                .await
                .unwrap_or_else(|| "n".to_string())
        } else {
            read_stdin_choice(agent, message).await?
        };

        match answer.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(Confirmation::Approve(message.to_string())),
            "n" | "no" => return Ok(Confirmation::Cancel),
            "r" | "retry" => return Ok(Confirmation::Retry),
            "e" | "edit" => {
                let edited = edit_in_editor(&agent.config.editor, message).await?;
                if edited.trim().is_empty() {
                    return Err(LeditErr::Usage("Empty commit message; aborting".to_string()));
                }
                return Ok(Confirmation::Approve(edited));
            }
            other => {
                agent
                    .ui
                    .log(format!("⚠️ Unrecognized response: {other} (y/n/e/r)"));
            }
        }
    }
}

async fn read_stdin_choice(agent: &mut Agent, message: &str) -> Result<String> {
    use tokio::io::AsyncBufReadExt;

    agent.ui.log(format!(
        "📝 Proposed commit message:\n{message}\n\nApprove? [Y/n/e/r] "
    ));
    let mut line = String::new();
    let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await?;
    Ok(line)
}

/// Run the operator's editor against a temp file seeded with the draft.
async fn edit_in_editor(editor: &str, draft: &str) -> Result<String> {
    let editor = editor.to_string();
    let draft = draft.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("ledit-commit-")
            .suffix(".txt")
            .tempfile()?;
        std::io::Write::write_all(&mut file, draft.as_bytes())?;
        let path = file.path().to_path_buf();

        let status = std::process::Command::new(&editor).arg(&path).status()?;
        if !status.success() {
            return Err(LeditErr::integration(
                format!("editor {editor} exited with {status}"),
                String::new(),
            ));
        }
        Ok(std::fs::read_to_string(&path)?)
    })
    .await
    .map_err(|e| LeditErr::integration("editor task failed", e.to_string()))?
}

/// Validate before handing the result to any emitter.
fn finish(result: CommitJsonResult) -> Result<CommitJsonResult> {
    result.validate().map_err(LeditErr::Invariant)?;
    Ok(result)
}
