//! Thin wrappers around the `git` binary.
//!
//! The commit workflow and the revision commands only ever talk to git
//! through these helpers so the error shape stays uniform: a nonzero exit
//! becomes [`LeditErr::Integration`] carrying the combined stdout+stderr.
//! No locks are taken on the index; concurrent staging by external tooling
//! is observed as it happens.

use std::path::Path;
use std::path::PathBuf;

use tokio::process::Command;

use crate::error::LeditErr;
use crate::error::Result;

/// Run git with `args` in `cwd`, returning stdout on success.
pub async fn run_git(cwd: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| LeditErr::integration(format!("failed to spawn git {args:?}"), e.to_string()))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(LeditErr::integration(
            format!("git {} failed", args.first().copied().unwrap_or("")),
            combined.trim().to_string(),
        ))
    }
}

pub async fn is_git_repo(cwd: &Path) -> bool {
    run_git(cwd, &["rev-parse", "--git-dir"]).await.is_ok()
}

pub async fn current_branch(cwd: &Path) -> Result<String> {
    let out = run_git(cwd, &["branch", "--show-current"]).await?;
    Ok(out.trim().to_string())
}

/// Paths with staged content, one per line from `--name-only`.
pub async fn staged_files(cwd: &Path) -> Result<Vec<String>> {
    let out = run_git(cwd, &["diff", "--cached", "--name-only"]).await?;
    Ok(out.lines().map(str::to_string).collect())
}

/// `(status, path)` pairs for the staged set, e.g. `("A", "src/new.rs")`.
/// Renames come back as `R<score>` with the new path.
pub async fn staged_name_status(cwd: &Path) -> Result<Vec<(String, String)>> {
    let out = run_git(cwd, &["diff", "--cached", "--name-status"]).await?;
    Ok(out
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = parts.next()?.trim().to_string();
            // For renames the line is `R100<TAB>old<TAB>new`; report the new path.
            let path = parts.next_back()?.trim().to_string();
            if status.is_empty() || path.is_empty() {
                None
            } else {
                Some((status, path))
            }
        })
        .collect())
}

/// `git status --porcelain` lines, `(xy, path)`.
pub async fn porcelain_status(cwd: &Path) -> Result<Vec<(String, String)>> {
    let out = run_git(cwd, &["status", "--porcelain"]).await?;
    Ok(out
        .lines()
        .filter_map(|line| {
            if line.len() < 4 {
                return None;
            }
            let (xy, path) = line.split_at(2);
            Some((xy.to_string(), path.trim().to_string()))
        })
        .collect())
}

pub async fn staged_diff(cwd: &Path) -> Result<String> {
    run_git(cwd, &["diff", "--cached"]).await
}

/// Staged diff restricted to one path, used by the deep review.
pub async fn staged_diff_for(cwd: &Path, path: &str) -> Result<String> {
    run_git(cwd, &["diff", "--cached", "--", path]).await
}

pub async fn stage_files(cwd: &Path, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut args: Vec<&str> = vec!["add", "--"];
    args.extend(paths.iter().map(String::as_str));
    run_git(cwd, &args).await?;
    Ok(())
}

pub async fn head_hash(cwd: &Path) -> Result<String> {
    let out = run_git(cwd, &["rev-parse", "HEAD"]).await?;
    Ok(out.trim().to_string())
}

/// Commit the staged set with a message file (`git commit -F`).
///
/// The message is written to a transient `commit_msg.txt` in `cwd` that is
/// removed again once git returns, success or not.
pub async fn commit_with_message(cwd: &Path, message: &str) -> Result<String> {
    let msg_path: PathBuf = cwd.join("commit_msg.txt");
    tokio::fs::write(&msg_path, message).await?;

    let result = run_git(cwd, &["commit", "-F", "commit_msg.txt"]).await;
    let _ = tokio::fs::remove_file(&msg_path).await;
    result
}
