use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry in the agent's ordered message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Accumulated token and cost counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cached_tokens: u64,
    pub total_tokens: u64,
    pub cost_usd: f64,
}

impl TokenUsage {
    /// Fold another usage sample into the running totals.
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.cached_tokens += other.cached_tokens;
        self.total_tokens += other.total_tokens;
        self.cost_usd += other.cost_usd;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Modify,
    Delete,
    Rename,
}

/// One recorded file mutation, carrying enough state to invert it.
///
/// Modifications carry both sides, creates only the new content, deletes only
/// the old content, renames both paths (plus content when it also changed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub op: ChangeOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<PathBuf>,
}

impl FileChange {
    pub fn create(path: impl Into<PathBuf>, new_content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: ChangeOp::Create,
            old_content: None,
            new_content: Some(new_content.into()),
            old_path: None,
        }
    }

    pub fn modify(
        path: impl Into<PathBuf>,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            op: ChangeOp::Modify,
            old_content: Some(old_content.into()),
            new_content: Some(new_content.into()),
            old_path: None,
        }
    }

    pub fn delete(path: impl Into<PathBuf>, old_content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: ChangeOp::Delete,
            old_content: Some(old_content.into()),
            new_content: None,
            old_path: None,
        }
    }

    pub fn rename(path: impl Into<PathBuf>, old_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            op: ChangeOp::Rename,
            old_content: None,
            new_content: None,
            old_path: Some(old_path.into()),
        }
    }
}

/// An atomic, sealed group of file mutations from one agent turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_id: String,
    pub timestamp: DateTime<Utc>,
    /// The operator instructions that opened this revision.
    pub instructions: String,
    pub changes: Vec<FileChange>,
    #[serde(default)]
    pub reverted: bool,
}

/// Persisted snapshot of the agent's conversational state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitStatus {
    Success,
    Error,
    DryRun,
}

/// Structured outcome of a non-interactive commit invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitJsonResult {
    pub status: CommitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

impl CommitJsonResult {
    /// Schema rules: `success` requires a commit hash, `error` requires an
    /// error string. Emitters must call this before printing; a failure here
    /// is a programmer error surfaced as a typed error, never emitted JSON.
    pub fn validate(&self) -> Result<(), String> {
        match self.status {
            CommitStatus::Success if self.commit.as_deref().unwrap_or("").is_empty() => {
                Err("success result is missing the commit hash".to_string())
            }
            CommitStatus::Error if self.error.as_deref().unwrap_or("").is_empty() => {
                Err("error result is missing the error string".to_string())
            }
            _ => Ok(()),
        }
    }
}
