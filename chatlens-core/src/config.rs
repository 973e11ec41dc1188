//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatlens/` (~/.config/chatlens/)
//! - State/Logs: `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)
//!
//! The `[conversations]` table replaces a hard-coded name → folder lookup:
//! each entry names one or more archive folders and the chart layout to use.

use crate::error::{Error, Result};
use crate::types::{ConversationMode, Metric, SameDayPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Participant name the analysis is written from
    #[serde(default)]
    pub self_name: String,

    /// Root of the extracted export
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,

    /// Where charts are written (one subdirectory per conversation)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Path from the archive root to the conversation folders
    #[serde(default = "default_inbox_prefix")]
    pub inbox_prefix: PathBuf,

    /// Analysis options
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named conversations
    #[serde(default)]
    pub conversations: BTreeMap<String, ConversationEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            self_name: String::new(),
            archive_dir: None,
            output_dir: default_output_dir(),
            inbox_prefix: default_inbox_prefix(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
            conversations: BTreeMap::new(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Output")
}

fn default_inbox_prefix() -> PathBuf {
    PathBuf::from("messages/inbox")
}

/// A named conversation: one or more archive folders analysed together.
#[derive(Debug, Deserialize, Clone)]
pub struct ConversationEntry {
    /// Folder identifiers under the inbox prefix
    pub folders: Vec<String>,
    /// Chart layout
    #[serde(default)]
    pub mode: ConversationMode,
}

/// Analysis options
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Same-day handling for per-message metrics
    #[serde(default)]
    pub same_day: SameDayPolicy,

    /// Number of entries kept in word rankings
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Watch list for the words-of-interest metric
    #[serde(default)]
    pub words_of_interest: Vec<String>,

    /// Watch list for the pronoun metric
    #[serde(default = "default_pronouns")]
    pub pronouns: Vec<String>,

    /// Metrics to compute, in order
    #[serde(default = "default_metrics")]
    pub metrics: Vec<Metric>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            same_day: SameDayPolicy::default(),
            top_k: default_top_k(),
            words_of_interest: vec![],
            pronouns: default_pronouns(),
            metrics: default_metrics(),
        }
    }
}

fn default_top_k() -> usize {
    crate::derive::DEFAULT_TOP_K
}

fn default_pronouns() -> Vec<String> {
    vec!["i".to_string(), "you".to_string()]
}

fn default_metrics() -> Vec<Metric> {
    Metric::ALL.to_vec()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Check the settings a run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.self_name.trim().is_empty() {
            return Err(Error::Config("self_name must be set".to_string()));
        }
        if self.analysis.top_k == 0 {
            return Err(Error::Config(
                "analysis.top_k must be at least 1".to_string(),
            ));
        }
        for (name, entry) in &self.conversations {
            if entry.folders.is_empty() {
                return Err(Error::Config(format!(
                    "conversation '{}' lists no folders",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Look up a named conversation.
    pub fn conversation(&self, name: &str) -> Result<&ConversationEntry> {
        self.conversations
            .get(name)
            .ok_or_else(|| Error::UnknownConversation(name.to_string()))
    }

    /// Root of the extracted export.
    pub fn archive_root(&self) -> Result<&Path> {
        self.archive_dir
            .as_deref()
            .ok_or_else(|| Error::Config("archive_dir must be set".to_string()))
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatlens/config.toml` (~/.config/chatlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatlens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatlens")
    }

    /// Returns the log file path prefix
    ///
    /// `$XDG_STATE_HOME/chatlens/chatlens.log` (~/.local/state/chatlens/chatlens.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatlens.log")
    }
}
