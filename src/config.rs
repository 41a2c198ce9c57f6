//! Configuration file parser for ~/.config/feedwire/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged, since they are usually typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `password` from the config file.
pub const PASSWORD_ENV: &str = "FEEDWIRE_PASSWORD";

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
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys may be given. Timing
/// values are milliseconds; geometry values are in scroll units (one list
/// row is [`crate::sync::ROW_UNITS`] units).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the feed server, e.g. `http://127.0.0.1:7070/`.
    pub server_url: String,

    /// HTTP basic-auth user, when the server requires one.
    pub username: Option<String>,

    /// HTTP basic-auth password. `FEEDWIRE_PASSWORD` takes precedence.
    pub password: Option<String>,

    /// Delay between status polls while the server is fetching feeds.
    pub poll_interval_ms: u64,

    /// Trailing delay before a search edit reloads the item list.
    pub search_debounce_ms: u64,

    /// Trailing delay before pane widths are persisted.
    pub resize_debounce_ms: u64,

    /// Trailing delay before filtered stats and the window title are recomputed.
    pub stats_debounce_ms: u64,

    /// Inner padding kept between a selected row and the list edges.
    pub scroll_padding: i64,

    /// Margin subtracted from half a page when scrolling the reading pane.
    pub content_scroll_margin: i64,

    /// Distance from the bottom of the item list that triggers loading more.
    pub load_more_threshold: i64,

    /// Default theme name: "light", "sepia" or "night".
    pub theme: String,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:7070/".to_string(),
            username: None,
            password: None,
            poll_interval_ms: 500,
            search_debounce_ms: 500,
            resize_debounce_ms: 1000,
            stats_debounce_ms: 500,
            scroll_padding: 10,
            content_scroll_margin: 40,
            load_more_threshold: 50,
            theme: "light".to_string(),
            keybindings: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("resize_debounce_ms", &self.resize_debounce_ms)
            .field("stats_debounce_ms", &self.stats_debounce_ms)
            .field("scroll_padding", &self.scroll_padding)
            .field("content_scroll_margin", &self.content_scroll_margin)
            .field("load_more_threshold", &self.load_more_threshold)
            .field("theme", &self.theme)
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 12] = [
    "server_url",
    "username",
    "password",
    "poll_interval_ms",
    "search_debounce_ms",
    "resize_debounce_ms",
    "stats_debounce_ms",
    "scroll_padding",
    "content_scroll_margin",
    "load_more_threshold",
    "theme",
    "keybindings",
];

impl Config {
    /// Maximum config file size (1 MiB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Oversized file → `Err(ConfigError::TooLarge)`
    /// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)`
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

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            server = %config.server_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Password to present to the server: the environment wins over the file.
    pub fn resolved_password(&self) -> Option<String> {
        match std::env::var(PASSWORD_ENV) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => self.password.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn stats_debounce(&self) -> Duration {
        Duration::from_millis(self.stats_debounce_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
