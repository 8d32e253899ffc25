//! Personas and sub-agent personas.
//!
//! A persona is a named configuration bundle the operator can activate on
//! the agent: optional provider/model overrides, a system prompt (inline or
//! from a file), and an optional tool allowlist. Sub-agent personas use the
//! same record type but live in their own table so a parent agent can hand
//! scoped tasks to a differently-configured worker.
//!
//! Everything persists in `$LEDIT_HOME/personas.toml`.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::LeditErr;
use crate::error::Result;

/// Tools a persona allowlist may reference. Unknown names warn on apply but
/// do not abort.
pub const KNOWN_TOOLS: &[&str] = &[
    "read_file",
    "write_file",
    "edit_file",
    "list_files",
    "search",
    "run_shell",
    "web_fetch",
    "task",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
}

impl PersonaConfig {
    /// The effective system prompt: inline text wins over the file.
    pub fn system_prompt(&self) -> Result<Option<String>> {
        if let Some(text) = &self.system_prompt_text {
            return Ok(Some(text.clone()));
        }
        match &self.system_prompt_file {
            Some(path) => Ok(Some(fs::read_to_string(path).map_err(|e| {
                LeditErr::Config(format!("cannot read prompt file {}: {e}", path.display()))
            })?)),
            None => Ok(None),
        }
    }

    /// Allowlisted tool names that are not known to the agent.
    pub fn unknown_tools(&self) -> Vec<String> {
        self.allowed_tools
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|t| !KNOWN_TOOLS.contains(&t.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersonaFile {
    #[serde(default)]
    personas: BTreeMap<String, PersonaConfig>,
    #[serde(default)]
    subagent_personas: BTreeMap<String, PersonaConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaKind {
    Agent,
    Subagent,
}

pub struct PersonaStore {
    path: PathBuf,
}

impl PersonaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<PersonaFile> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|e| LeditErr::Config(format!("invalid personas.toml: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersonaFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, file: &PersonaFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(file)
            .map_err(|e| LeditErr::Config(format!("cannot serialize personas.toml: {e}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn list(&self, kind: PersonaKind) -> Result<Vec<(String, PersonaConfig)>> {
        let file = self.read()?;
        let table = match kind {
            PersonaKind::Agent => file.personas,
            PersonaKind::Subagent => file.subagent_personas,
        };
        Ok(table.into_iter().collect())
    }

    pub fn get(&self, kind: PersonaKind, id: &str) -> Result<PersonaConfig> {
        self.list(kind)?
            .into_iter()
            .find(|(persona_id, _)| persona_id == id)
            .map(|(_, persona)| persona)
            .ok_or_else(|| LeditErr::Usage(format!("unknown persona: {id}")))
    }

    /// Create a disabled, empty persona; fails if the id is taken.
    pub fn create(&self, kind: PersonaKind, id: &str) -> Result<()> {
        let mut file = self.read()?;
        let table = match kind {
            PersonaKind::Agent => &mut file.personas,
            PersonaKind::Subagent => &mut file.subagent_personas,
        };
        if table.contains_key(id) {
            return Err(LeditErr::Usage(format!("persona already exists: {id}")));
        }
        table.insert(
            id.to_string(),
            PersonaConfig {
                name: id.to_string(),
                ..PersonaConfig::default()
            },
        );
        self.write(&file)
    }

    /// Apply `update` to an existing persona and persist the result.
    pub fn update(
        &self,
        kind: PersonaKind,
        id: &str,
        update: impl FnOnce(&mut PersonaConfig),
    ) -> Result<PersonaConfig> {
        let mut file = self.read()?;
        let table = match kind {
            PersonaKind::Agent => &mut file.personas,
            PersonaKind::Subagent => &mut file.subagent_personas,
        };
        let persona = table
            .get_mut(id)
            .ok_or_else(|| LeditErr::Usage(format!("unknown persona: {id}")))?;
        update(persona);
        let updated = persona.clone();
        self.write(&file)?;
        Ok(updated)
    }
}
