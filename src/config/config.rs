use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub editor: EditorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the academy backend, without the `/api/cms` prefix
    pub base_url: String,

    /// Session cookie sent with every request (e.g. "session=abc123").
    /// Leave unset to rely on cookies set by the backend during the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before an autosave is sent
    pub autosave_delay_ms: u64,

    /// Ask the backend to generate AI content when saving
    pub generate_ai_content: bool,

    /// Ask before discarding unsaved edits when switching sections
    pub confirm_discard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Number of recent log lines kept for the `log` command
    pub ring_buffer_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_cookie: None,
            timeout_secs: 30,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 2000,
            generate_ai_content: false,
            confirm_discard: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ring_buffer_size: 1000,
        }
    }
}

impl EditorConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`, writing the defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("academy-cms").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Academy CMS Configuration File
# Location: ~/.config/academy-cms/config.toml (Linux)
#           ~/Library/Application Support/academy-cms/config.toml (macOS)
#           %APPDATA%\academy-cms\config.toml (Windows)

[api]
# Backend root; the CMS endpoints live under /api/cms
base_url = "http://localhost:3000"

# Session cookie copied from a logged-in admin browser session
# session_cookie = "session=..."

# Request timeout in seconds
timeout_secs = 30

[editor]
# Milliseconds of inactivity before edits are autosaved
autosave_delay_ms = 2000

# Ask the backend to generate AI copy and an SEO score on save
generate_ai_content = false

# Ask before discarding unsaved edits when switching sections
confirm_discard = true

[logging]
# Default log level (RUST_LOG overrides this)
level = "info"

# Recent log lines kept in memory for the `log` command
ring_buffer_size = 1000
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.editor.autosave_delay(), Duration::from_secs(2));
        assert!(config.editor.confirm_discard);
    }

    #[test]
    fn test_commented_defaults_match() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[editor]
autosave_delay_ms = 500
"#,
        )
        .unwrap();
        assert_eq!(parsed.editor.autosave_delay_ms, 500);
        assert!(!parsed.editor.generate_ai_content);
        assert_eq!(parsed.api, ApiConfig::default());
    }
}
