//! Revision tracking and rollback.
//!
//! Every file mutation performed while handling one operator request is
//! grouped under a single revision id. A revision is opened when the agent
//! starts a request that will touch files, accumulates [`FileChange`]
//! records as tool calls succeed, and is sealed when control returns to the
//! prompt. Sealed revisions can be enumerated newest-first and reverted by
//! applying each change's inverse in reverse order.
//!
//! The tracker promises content-level inverse application only: it does not
//! guard against external mutation of the same paths between the revision
//! and the revert.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use ledit_protocol::ChangeOp;
use ledit_protocol::FileChange;
use ledit_protocol::Revision;

use crate::error::LeditErr;
use crate::error::Result;

/// Outcome of a [`RevisionTracker::revert`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertReport {
    pub revision_id: String,
    pub restored: usize,
    pub failures: Vec<String>,
    pub already_reverted: bool,
}

impl RevertReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RevisionTracker {
    enabled: bool,
    /// Sealed revisions, oldest first. Enumeration reverses.
    revisions: Vec<Revision>,
    current: Option<Revision>,
    /// JSON document holding this session's sealed revisions.
    store_path: PathBuf,
}

impl RevisionTracker {
    /// Load (or start) the revision log for `session_id`.
    pub fn new(revisions_dir: &Path, session_id: &str) -> Self {
        let store_path = revisions_dir.join(format!("{session_id}.json"));
        let revisions = match fs::read_to_string(&store_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        Self {
            enabled: true,
            revisions,
            current: None,
            store_path,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Allocate a fresh revision for the given operator instructions.
    ///
    /// Ids are opaque to callers but order by allocation time so the log can
    /// be sorted without parsing timestamps.
    pub fn open_revision(&mut self, instructions: &str) -> String {
        if let Some(current) = self.current.take() {
            // A still-open revision means the previous turn never sealed;
            // seal it now rather than losing its changes.
            self.push_sealed(current);
        }
        let now = Utc::now();
        let revision_id = format!(
            "rev-{}-{}",
            now.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        self.current = Some(Revision {
            revision_id: revision_id.clone(),
            timestamp: now,
            instructions: instructions.to_string(),
            changes: Vec::new(),
            reverted: false,
        });
        revision_id
    }

    /// Record one successful file mutation under the open revision.
    pub fn record_change(&mut self, change: FileChange) {
        if !self.enabled {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            current.changes.push(change);
        }
    }

    /// Seal the open revision. Empty revisions are discarded.
    pub fn seal_revision(&mut self) {
        if let Some(current) = self.current.take() {
            if current.changes.is_empty() {
                return;
            }
            self.push_sealed(current);
        }
    }

    fn push_sealed(&mut self, revision: Revision) {
        if revision.changes.is_empty() {
            return;
        }
        self.revisions.push(revision);
        self.persist();
    }

    /// Sealed revisions, newest first.
    pub fn revision_groups(&self) -> Vec<Revision> {
        let mut groups = self.revisions.clone();
        groups.reverse();
        groups
    }

    /// Id of the open revision, or of the most recent sealed one.
    pub fn revision_id(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|r| r.revision_id.clone())
            .or_else(|| self.revisions.last().map(|r| r.revision_id.clone()))
    }

    /// Total recorded changes this session, open revision included.
    pub fn change_count(&self) -> usize {
        let sealed: usize = self.revisions.iter().map(|r| r.changes.len()).sum();
        sealed + self.current.as_ref().map_or(0, |r| r.changes.len())
    }

    /// Every path touched this session, deduplicated and sorted.
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut files = BTreeSet::new();
        for revision in self.revisions.iter().chain(self.current.as_ref()) {
            for change in &revision.changes {
                files.insert(change.path.clone());
                if let Some(old_path) = &change.old_path {
                    files.insert(old_path.clone());
                }
            }
        }
        files.into_iter().collect()
    }

    /// Human summary for `/changes`: one block per revision, newest first,
    /// with a line-delta figure for modifications.
    pub fn changes_summary(&self) -> String {
        if self.revisions.is_empty() && self.current.is_none() {
            return "No tracked changes in this session.".to_string();
        }
        let mut out = String::new();
        let open = self.current.clone().into_iter();
        for revision in open.chain(self.revision_groups()) {
            out.push_str(&format!(
                "🔄 {} — {} ({} change{}{})\n",
                revision.revision_id,
                revision.instructions,
                revision.changes.len(),
                if revision.changes.len() == 1 { "" } else { "s" },
                if revision.reverted { ", reverted" } else { "" },
            ));
            for change in &revision.changes {
                out.push_str(&format!("  {}\n", describe_change(change)));
            }
        }
        out.trim_end().to_string()
    }

    /// Apply the inverse of every change in `revision_id`, newest change
    /// first. Best-effort: a failing inverse does not stop the rest; all
    /// failures are reported and the revision is only marked reverted when
    /// every inverse succeeded.
    pub fn revert(&mut self, revision_id: &str) -> Result<RevertReport> {
        let revision = self
            .revisions
            .iter_mut()
            .find(|r| r.revision_id == revision_id)
            .ok_or_else(|| LeditErr::Usage(format!("unknown revision: {revision_id}")))?;

        if revision.reverted {
            return Ok(RevertReport {
                revision_id: revision_id.to_string(),
                restored: 0,
                failures: Vec::new(),
                already_reverted: true,
            });
        }

        let mut restored = 0usize;
        let mut failures = Vec::new();
        for change in revision.changes.iter().rev() {
            match apply_inverse(change) {
                Ok(()) => restored += 1,
                Err(e) => failures.push(format!("{}: {e}", change.path.display())),
            }
        }

        if failures.is_empty() {
            revision.reverted = true;
        }
        let report = RevertReport {
            revision_id: revision_id.to_string(),
            restored,
            failures,
            already_reverted: false,
        };
        self.persist();
        Ok(report)
    }

    fn persist(&self) {
        if let Some(parent) = self.store_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "failed to create revisions dir");
                return;
            }
        }
        match serde_json::to_string_pretty(&self.revisions) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.store_path, raw) {
                    tracing::warn!(error = %e, "failed to persist revision log");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize revision log"),
        }
    }
}

fn describe_change(change: &FileChange) -> String {
    match change.op {
        ChangeOp::Create => format!("create {}", change.path.display()),
        ChangeOp::Delete => format!("delete {}", change.path.display()),
        ChangeOp::Rename => {
            let from = change
                .old_path
                .as_ref()
                .map_or_else(|| "?".to_string(), |p| p.display().to_string());
            format!("rename {from} -> {}", change.path.display())
        }
        ChangeOp::Modify => {
            let (old_text, new_text) = (
                change.old_content.as_deref().unwrap_or(""),
                change.new_content.as_deref().unwrap_or(""),
            );
            let diff = similar::TextDiff::from_lines(old_text, new_text);
            let mut added = 0usize;
            let mut removed = 0usize;
            for op in diff.iter_all_changes() {
                match op.tag() {
                    similar::ChangeTag::Insert => added += 1,
                    similar::ChangeTag::Delete => removed += 1,
                    similar::ChangeTag::Equal => {}
                }
            }
            format!("modify {} (+{added} -{removed})", change.path.display())
        }
    }
}

/// Restore the pre-change state for a single [`FileChange`].
fn apply_inverse(change: &FileChange) -> Result<()> {
    match change.op {
        ChangeOp::Create => {
            fs::remove_file(&change.path)?;
            Ok(())
        }
        ChangeOp::Modify => {
            let old_content = change.old_content.as_deref().ok_or_else(|| {
                LeditErr::Invariant("modify change without old_content".to_string())
            })?;
            write_restoring_parents(&change.path, old_content)
        }
        ChangeOp::Delete => {
            let old_content = change.old_content.as_deref().ok_or_else(|| {
                LeditErr::Invariant("delete change without old_content".to_string())
            })?;
            write_restoring_parents(&change.path, old_content)
        }
        ChangeOp::Rename => {
            let old_path = change
                .old_path
                .as_ref()
                .ok_or_else(|| LeditErr::Invariant("rename change without old_path".to_string()))?;
            fs::rename(&change.path, old_path)?;
            if let Some(old_content) = change.old_content.as_deref() {
                write_restoring_parents(old_path, old_content)?;
            }
            Ok(())
        }
    }
}

fn write_restoring_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn tracker_in(dir: &Path) -> RevisionTracker {
        RevisionTracker::new(&dir.join("revs"), "session-1")
    }

    #[test]
    fn revert_restores_prior_content_then_removes_created_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        let mut tracker = tracker_in(dir.path());

        let r1 = tracker.open_revision("create a.txt");
        fs::write(&file, "one").unwrap();
        tracker.record_change(FileChange::create(&file, "one"));
        tracker.seal_revision();

        let r2 = tracker.open_revision("bump a.txt");
        fs::write(&file, "two").unwrap();
        tracker.record_change(FileChange::modify(&file, "one", "two"));
        tracker.seal_revision();

        let report = tracker.revert(&r2).unwrap();
        assert!(report.succeeded());
        assert_eq!(fs::read_to_string(&file).unwrap(), "one");

        let report = tracker.revert(&r1).unwrap();
        assert!(report.succeeded());
        assert!(!file.exists());
    }

    #[test]
    fn revert_applies_inverses_in_reverse_order() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        let mut tracker = tracker_in(dir.path());

        let r1 = tracker.open_revision("create then edit");
        fs::write(&file, "final").unwrap();
        tracker.record_change(FileChange::create(&file, "first"));
        tracker.record_change(FileChange::modify(&file, "first", "final"));
        tracker.seal_revision();

        // Modify is inverted before create, so the file ends up gone.
        let report = tracker.revert(&r1).unwrap();
        assert!(report.succeeded());
        assert!(!file.exists());
    }

    #[test]
    fn double_revert_is_a_noop() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        let mut tracker = tracker_in(dir.path());

        let r1 = tracker.open_revision("create");
        fs::write(&file, "x").unwrap();
        tracker.record_change(FileChange::create(&file, "x"));
        tracker.seal_revision();

        assert!(tracker.revert(&r1).unwrap().succeeded());
        let second = tracker.revert(&r1).unwrap();
        assert!(second.already_reverted);
        assert_eq!(second.restored, 0);
    }

    #[test]
    fn failed_inverse_keeps_revision_revertable() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        let mut tracker = tracker_in(dir.path());

        let r1 = tracker.open_revision("create");
        tracker.record_change(FileChange::create(&file, "x"));
        tracker.seal_revision();

        // The file was never written, so removing it fails.
        let report = tracker.revert(&r1).unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.failures.len(), 1);

        // Not marked reverted; a later retry still runs the inverses.
        assert!(!tracker.revert(&r1).unwrap().already_reverted);
    }

    #[test]
    fn rename_inverse_restores_old_path() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        let mut tracker = tracker_in(dir.path());

        fs::write(&old, "body").unwrap();
        let r1 = tracker.open_revision("rename");
        fs::rename(&old, &new).unwrap();
        tracker.record_change(FileChange::rename(&new, &old));
        tracker.seal_revision();

        assert!(tracker.revert(&r1).unwrap().succeeded());
        assert!(old.exists());
        assert!(!new.exists());
    }

    #[test]
    fn enumeration_is_newest_first_and_persists() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        let r1 = tracker.open_revision("first");
        tracker.record_change(FileChange::create(dir.path().join("1"), "1"));
        tracker.seal_revision();
        let r2 = tracker.open_revision("second");
        tracker.record_change(FileChange::create(dir.path().join("2"), "2"));
        tracker.seal_revision();

        let groups = tracker.revision_groups();
        assert_eq!(groups[0].revision_id, r2);
        assert_eq!(groups[1].revision_id, r1);

        // A fresh tracker for the same session sees the same log.
        let reloaded = tracker_in(dir.path());
        assert_eq!(reloaded.revision_groups().len(), 2);
        assert_eq!(reloaded.change_count(), 2);
    }

    #[test]
    fn tracked_files_and_summary_cover_open_revision() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        tracker.open_revision("work in progress");
        tracker.record_change(FileChange::modify(dir.path().join("a.rs"), "x\n", "y\n"));

        assert_eq!(tracker.tracked_files(), vec![dir.path().join("a.rs")]);
        assert_eq!(tracker.change_count(), 1);
        let summary = tracker.changes_summary();
        assert!(summary.contains("modify"), "summary: {summary}");
    }
}
