//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as likely typos.
//!
//! The list preferences here (`show_read_entries`, `sort_order`, ...) are
//! only defaults. Once changed from inside the app, the value stored in the
//! database wins.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::storage::{Conf, SortOrder};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// Command used to open links of feeds that opt out of the built-in
    /// (system default) browser. `None` falls back to the system default.
    pub browser: Option<String>,

    /// How long a swipe can be undone, in seconds.
    pub undo_window_secs: u64,

    /// JSON snapshot to sync from. `None` runs cache-only.
    pub sync_file: Option<PathBuf>,

    pub show_read_entries: bool,
    pub sort_order: SortOrder,
    pub mark_scrolled_entries_as_read: bool,
    pub sync_on_startup: bool,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let conf = Conf::default();
        Self {
            theme: "dark".to_string(),
            browser: None,
            undo_window_secs: 5,
            sync_file: None,
            show_read_entries: conf.show_read_entries,
            sort_order: conf.sort_order,
            mark_scrolled_entries_as_read: conf.mark_scrolled_entries_as_read,
            sync_on_startup: conf.sync_on_startup,
            keybindings: HashMap::new(),
        }
    }
}

/// Upper bound for `undo_window_secs`.
pub const MAX_UNDO_WINDOW_SECS: u64 = 60;

const KNOWN_KEYS: [&str; 9] = [
    "theme",
    "browser",
    "undo_window_secs",
    "sync_file",
    "show_read_entries",
    "sort_order",
    "mark_scrolled_entries_as_read",
    "sync_on_startup",
    "keybindings",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(theme = %config.theme, sort_order = config.sort_order.as_str(), "Loaded configuration");
        Ok(config)
    }

    /// Defaults for the persisted list conf.
    pub fn conf_defaults(&self) -> Conf {
        Conf {
            show_read_entries: self.show_read_entries,
            sort_order: self.sort_order,
            mark_scrolled_entries_as_read: self.mark_scrolled_entries_as_read,
            sync_on_startup: self.sync_on_startup,
            ..Conf::default()
        }
    }

    /// How long a swipe stays undoable, clamped to 1..=60 seconds.
    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs.clamp(1, MAX_UNDO_WINDOW_SECS))
    }
}

// ============================================================================
// Tests
// ============================================================================
