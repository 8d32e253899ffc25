//! Session persistence.
//!
//! One JSON document per session id under `$LEDIT_HOME/sessions/`. The store
//! itself is agent-agnostic: it reads and writes [`SessionState`] values and
//! leaves installing them onto the live agent to the caller. Listing is
//! always newest-first by `last_updated`.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;

use ledit_protocol::SessionState;

use crate::error::LeditErr;
use crate::error::Result;

/// Listing entry: `(session_id, display name, last_updated)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListing {
    pub session_id: String,
    pub name: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Write the snapshot, stamping `last_updated`.
    pub fn save_state(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut stamped = state.clone();
        stamped.last_updated = Utc::now();
        let raw = serde_json::to_string_pretty(&stamped)?;
        fs::write(self.path_for(&state.session_id), raw)?;
        Ok(())
    }

    pub fn load_state(&self, session_id: &str) -> Result<SessionState> {
        let path = self.path_for(session_id);
        let raw = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LeditErr::Usage(format!("no session with id {session_id}"))
            } else {
                e.into()
            }
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load for inspection or export without installing onto an agent.
    /// Identical to [`SessionStore::load_state`]; the separate name keeps the
    /// call sites honest about intent.
    pub fn load_state_without_agent(&self, session_id: &str) -> Result<SessionState> {
        self.load_state(session_id)
    }

    /// All sessions, newest-first by `last_updated`.
    pub fn list_sessions_with_timestamps(&self) -> Result<Vec<SessionListing>> {
        let mut listings = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "unreadable session file");
                    continue;
                }
            };
            match serde_json::from_str::<SessionState>(&raw) {
                Ok(state) => listings.push(SessionListing {
                    session_id: state.session_id,
                    name: state.name,
                    last_updated: state.last_updated,
                    message_count: state.messages.len(),
                }),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "corrupt session file");
                }
            }
        }
        listings.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(listings)
    }

    /// Short label for unnamed sessions: the first user message, truncated.
    pub fn get_session_preview(&self, session_id: &str) -> Result<String> {
        let state = self.load_state(session_id)?;
        if let Some(name) = state.name.filter(|n| !n.is_empty()) {
            return Ok(name);
        }
        let preview = state
            .messages
            .iter()
            .find(|m| m.role == ledit_protocol::Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(empty session)");
        let mut label: String = preview.chars().take(48).collect();
        if preview.chars().count() > 48 {
            label.push('…');
        }
        Ok(label.replace('\n', " "))
    }

    /// Update the stored name atomically (rewrite of the single document).
    pub fn rename_session(&self, session_id: &str, name: &str) -> Result<()> {
        let mut state = self.load_state(session_id)?;
        state.name = Some(name.to_string());
        self.save_state(&state)
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = self.path_for(session_id);
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LeditErr::Usage(format!("no session with id {session_id}"))
            } else {
                LeditErr::Io(e)
            }
        })
    }

    pub fn export_state_to_json(&self, state: &SessionState) -> Result<String> {
        Ok(serde_json::to_string_pretty(state)?)
    }

    pub fn import_state_from_json_file(&self, path: &Path) -> Result<SessionState> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve a `/sessions` selector: a 1-based index into the newest-first
    /// listing, or a session-id prefix.
    pub fn resolve_selector(&self, selector: &str) -> Result<String> {
        let listings = self.list_sessions_with_timestamps()?;
        if let Ok(index) = selector.parse::<usize>() {
            if index >= 1 && index <= listings.len() {
                return Ok(listings[index - 1].session_id.clone());
            }
            return Err(LeditErr::Usage(format!(
                "session index out of range: {index} (have {})",
                listings.len()
            )));
        }
        let matches: Vec<&SessionListing> = listings
            .iter()
            .filter(|l| l.session_id.starts_with(selector))
            .collect();
        match matches.as_slice() {
            [] => Err(LeditErr::Usage(format!("no session matches {selector}"))),
            [one] => Ok(one.session_id.clone()),
            _ => Err(LeditErr::Usage(format!(
                "ambiguous session prefix {selector} ({} matches)",
                matches.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use ledit_protocol::Message;
    use ledit_protocol::TokenUsage;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn state(id: &str, summary: &str) -> SessionState {
        SessionState {
            session_id: id.to_string(),
            name: None,
            last_updated: Utc::now(),
            messages: vec![
                Message::user("please refactor the parser"),
                Message::assistant("done"),
                Message::user("thanks"),
            ],
            summary: summary.to_string(),
            revision_id: None,
            provider: "openai".to_string(),
            model: "gpt-5".to_string(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                cached_tokens: 0,
                total_tokens: 120,
                cost_usd: 0.01,
            },
            persona_id: None,
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let s = state("abc-123", "S");
        store.save_state(&s).unwrap();

        let loaded = store.load_state("abc-123").unwrap();
        assert_eq!(loaded.messages, s.messages);
        assert_eq!(loaded.summary, "S");
        assert_eq!(loaded.provider, "openai");
        assert_eq!(loaded.model, "gpt-5");
        assert_eq!(loaded.usage, s.usage);
    }

    #[test]
    fn export_import_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("sessions"));
        let s = state("abc-123", "S");

        let json = store.export_state_to_json(&s).unwrap();
        let file = dir.path().join("x.json");
        fs::write(&file, json).unwrap();

        let imported = store.import_state_from_json_file(&file).unwrap();
        assert_eq!(imported, s);
    }

    #[test]
    fn listing_is_newest_first() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let mut old = state("old", "");
        old.last_updated = Utc::now() - chrono::Duration::hours(2);
        let raw = serde_json::to_string_pretty(&old).unwrap();
        fs::write(dir.path().join("old.json"), raw).unwrap();

        store.save_state(&state("new", "")).unwrap();

        let listings = store.list_sessions_with_timestamps().unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].session_id, "new");
        assert!(listings[0].last_updated >= listings[1].last_updated);
    }

    #[test]
    fn selector_accepts_index_and_prefix() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_state(&state("abc-123", "")).unwrap();
        store.save_state(&state("abd-456", "")).unwrap();

        assert_eq!(store.resolve_selector("abc").unwrap(), "abc-123");
        assert!(store.resolve_selector("ab").is_err());
        assert!(store.resolve_selector("1").is_ok());
        assert!(store.resolve_selector("9").is_err());
    }

    #[test]
    fn rename_and_delete() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_state(&state("abc-123", "")).unwrap();

        store.rename_session("abc-123", "parser work").unwrap();
        assert_eq!(store.get_session_preview("abc-123").unwrap(), "parser work");

        store.delete_session("abc-123").unwrap();
        assert!(store.load_state("abc-123").is_err());
        assert!(store.delete_session("abc-123").is_err());
    }

    #[test]
    fn preview_falls_back_to_first_user_message() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_state(&state("abc-123", "")).unwrap();
        assert_eq!(
            store.get_session_preview("abc-123").unwrap(),
            "please refactor the parser"
        );
    }
}
