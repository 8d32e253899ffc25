//! Runtime configuration.
//!
//! Environment variables are read exactly once, here, when the process
//! starts; everything downstream receives the resulting [`Config`] record.
//! On-disk settings live in `$LEDIT_HOME/config.toml` and are overlaid by
//! the environment, so an operator export always wins over the file.

use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::error::LeditErr;
use crate::error::Result;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-5";

/// Subset of the configuration that is persisted in `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigToml {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub subagent_provider: Option<String>,
    pub subagent_model: Option<String>,
    /// External tool endpoints managed by `/mcp`.
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct Config {
    /// State directory, default `~/.ledit`. Sessions, revisions, personas,
    /// config and logs all live under it.
    pub ledit_home: PathBuf,
    pub cwd: PathBuf,
    pub provider: String,
    pub model: String,
    pub subagent_provider: Option<String>,
    pub subagent_model: Option<String>,
    pub mcp_servers: HashMap<String, McpServerConfig>,

    /// The TUI is driving this process (`LEDIT_AGENT_CONSOLE=1`). Selects the
    /// modal-prompt branches over the plain-stdin branches.
    pub agent_console: bool,
    pub from_agent: bool,
    pub skip_prompt: bool,
    pub using_coder: bool,
    /// Initial collapse state of the logs pane.
    pub logs_collapsed: bool,

    /// `$SHELL`, falling back to `/bin/sh` (POSIX) or `cmd.exe` (Windows).
    pub shell: String,
    /// `$VISUAL` → `$EDITOR` → `vi`.
    pub editor: String,
}

impl Config {
    /// Build the configuration from `config.toml` (if present) overlaid with
    /// the environment. This is the only place the process reads env vars.
    pub fn load() -> Result<Self> {
        let ledit_home = match std::env::var_os("LEDIT_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| LeditErr::Config("could not determine home directory".to_string()))?
                .join(".ledit"),
        };
        let cwd = std::env::current_dir()?;
        Self::load_from(ledit_home, cwd)
    }

    /// Like [`Config::load`] with explicit roots; the seam tests use.
    pub fn load_from(ledit_home: PathBuf, cwd: PathBuf) -> Result<Self> {
        let file: ConfigToml = match std::fs::read_to_string(ledit_home.join("config.toml")) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|e| LeditErr::Config(format!("invalid config.toml: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigToml::default(),
            Err(e) => return Err(e.into()),
        };

        let shell = std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_shell);
        let editor = std::env::var("VISUAL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "vi".to_string());

        Ok(Self {
            ledit_home,
            cwd,
            provider: file.provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            model: file.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            subagent_provider: file.subagent_provider,
            subagent_model: file.subagent_model,
            mcp_servers: file.mcp_servers,
            agent_console: env_flag("LEDIT_AGENT_CONSOLE"),
            from_agent: env_flag("LEDIT_FROM_AGENT"),
            skip_prompt: env_flag("LEDIT_SKIP_PROMPT"),
            using_coder: env_flag("LEDIT_USING_CODER"),
            logs_collapsed: parse_logs_collapsed(std::env::var("LEDIT_LOGS_COLLAPSED").ok()),
            shell,
            editor,
        })
    }

    /// Export the agent-facing env trio before the agent worker is
    /// constructed, so any child process it spawns sees the same view.
    pub fn set_agent_env(&self) {
        // SAFETY: called once during single-threaded startup, before the
        // runtime spawns worker threads.
        unsafe {
            std::env::set_var("LEDIT_AGENT_CONSOLE", "1");
            std::env::set_var("LEDIT_FROM_AGENT", "1");
            std::env::set_var("LEDIT_USING_CODER", "1");
            if self.skip_prompt {
                std::env::set_var("LEDIT_SKIP_PROMPT", "1");
            }
        }
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.ledit_home.join("sessions")
    }

    pub fn revisions_dir(&self) -> PathBuf {
        self.ledit_home.join("revisions")
    }

    pub fn personas_file(&self) -> PathBuf {
        self.ledit_home.join("personas.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.ledit_home.join("log")
    }

    /// Rewrite `config.toml` with the given persisted subset.
    pub fn save_toml(&self, file: &ConfigToml) -> Result<()> {
        std::fs::create_dir_all(&self.ledit_home)?;
        let raw = toml::to_string_pretty(file)
            .map_err(|e| LeditErr::Config(format!("could not serialize config.toml: {e}")))?;
        std::fs::write(self.ledit_home.join("config.toml"), raw)?;
        Ok(())
    }

    pub fn to_toml(&self) -> ConfigToml {
        ConfigToml {
            provider: Some(self.provider.clone()),
            model: Some(self.model.clone()),
            subagent_provider: self.subagent_provider.clone(),
            subagent_model: self.subagent_model.clone(),
            mcp_servers: self.mcp_servers.clone(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1")
}

/// `0`, `false` and `no` (any case) mean expanded; anything else set means
/// collapsed; unset means expanded.
fn parse_logs_collapsed(value: Option<String>) -> bool {
    match value {
        None => false,
        Some(v) => {
            let v = v.trim().to_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no")
        }
    }
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd.exe".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

/// Test-only constructor rooted in a scratch directory.
pub fn test_config(root: &Path) -> Config {
    Config {
        ledit_home: root.join(".ledit"),
        cwd: root.to_path_buf(),
        provider: DEFAULT_PROVIDER.to_string(),
        model: DEFAULT_MODEL.to_string(),
        subagent_provider: None,
        subagent_model: None,
        mcp_servers: HashMap::new(),
        agent_console: false,
        from_agent: false,
        skip_prompt: false,
        using_coder: false,
        logs_collapsed: false,
        shell: default_shell(),
        editor: "vi".to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    use super::*;

    #[test]
    fn logs_collapsed_parsing() {
        assert!(!parse_logs_collapsed(None));
        assert!(!parse_logs_collapsed(Some("0".to_string())));
        assert!(!parse_logs_collapsed(Some("false".to_string())));
        assert!(!parse_logs_collapsed(Some("NO".to_string())));
        assert!(parse_logs_collapsed(Some("1".to_string())));
        assert!(parse_logs_collapsed(Some("yes".to_string())));
    }

    #[test]
    fn toml_round_trip_keeps_mcp_servers() {
        let mut file = ConfigToml {
            provider: Some("groq".to_string()),
            ..Default::default()
        };
        file.mcp_servers.insert(
            "search".to_string(),
            McpServerConfig {
                url: "http://localhost:3001".to_string(),
                enabled: false,
            },
        );
        let raw = toml::to_string_pretty(&file).expect("serialize");
        let back: ConfigToml = toml::from_str(&raw).expect("parse");
        assert_eq!(back.provider.as_deref(), Some("groq"));
        assert_eq!(
            back.mcp_servers.get("search"),
            Some(&McpServerConfig {
                url: "http://localhost:3001".to_string(),
                enabled: false,
            })
        );
    }
}
