//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use et_core::RecordContext;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name stamped on every activity record.
    pub username: String,
    /// Base URL of the aggregation backend.
    pub api_endpoint: String,
    /// Master switch. When off, nothing is sampled, tracked or sent.
    pub enabled: bool,
    /// Attach content snippets to outgoing records.
    pub track_content_snippets: bool,
    /// Quiet period before accumulated changes are flushed.
    pub debounce_interval_ms: u64,
    /// Editor version reported in records.
    pub editor_version: String,
    /// Command printing the clipboard text to stdout. Empty disables
    /// clipboard reads, which turns paste detection off.
    pub clipboard_command: Vec<String>,
    /// Per-request timeout for backend calls.
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("api_endpoint", &self.api_endpoint)
            .field("enabled", &self.enabled)
            .field("track_content_snippets", &self.track_content_snippets)
            .field("debounce_interval_ms", &self.debounce_interval_ms)
            .field("editor_version", &self.editor_version)
            .field("clipboard_command", &self.clipboard_command)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_endpoint: String::new(),
            enabled: true,
            track_content_snippets: true,
            debounce_interval_ms: 2000,
            editor_version: "unknown".to_string(),
            clipboard_command: default_clipboard_command(),
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ET_*)
        figment = figment.merge(Env::prefixed("ET_"));

        figment.extract()
    }

    /// Required settings that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.trim().is_empty() {
            missing.push("username");
        }
        if self.api_endpoint.trim().is_empty() {
            missing.push("api_endpoint");
        }
        missing
    }

    pub const fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn record_context(&self) -> RecordContext {
        RecordContext {
            username: self.username.clone(),
            editor_version: self.editor_version.clone(),
            include_snippets: self.track_content_snippets,
        }
    }
}

/// Logs a warning when required settings are missing.
///
/// Tracking carries on regardless: records get an empty username and sends
/// fail until an endpoint is configured.
pub fn warn_if_incomplete(config: &Config) {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "configuration incomplete; activity will be tracked but may not be delivered"
        );
    }
}

/// Platform clipboard reader used when none is configured.
fn default_clipboard_command() -> Vec<String> {
    let command: &[&str] = if cfg!(target_os = "macos") {
        &["pbpaste"]
    } else if cfg!(windows) {
        &["powershell", "-NoProfile", "-Command", "Get-Clipboard -Raw"]
    } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        &["wl-paste", "--no-newline"]
    } else {
        &["xclip", "-selection", "clipboard", "-o"]
    };
    command.iter().map(ToString::to_string).collect()
}

/// Returns the platform-specific config directory for et.
///
/// On Linux: `~/.config/et`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("et"))
}
