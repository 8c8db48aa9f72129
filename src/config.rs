// Configuration management module
// Handles loading, saving, and validating configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Discord application registered for the presence assets
pub const DEFAULT_DISCORD_APP_ID: i64 = 584458858731405315;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds to sleep between two now playing polls
    pub refresh_interval: u64,

    /// Seconds between two session key exchange attempts during first-run authorization
    #[serde(default = "default_auth_poll_interval")]
    pub auth_poll_interval: u64,

    /// Where the username and session key are kept (defaults to ~/.session_key)
    #[serde(default)]
    pub session_file: Option<PathBuf>,

    /// Executable name of the desktop player. While it is running, a track
    /// vanishing from Last.fm is treated as a pause rather than a stop.
    #[serde(default)]
    pub player_process: Option<String>,

    /// Text cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Last.fm configuration
    pub lastfm: LastFmConfig,

    /// Discord configuration
    #[serde(default)]
    pub discord: DiscordConfig,
}

fn default_auth_poll_interval() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Enable text cleanup
    pub enabled: bool,

    /// Regex patterns to remove from track and artist names
    /// Applied in order, each pattern is removed from the text
    pub patterns: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            patterns: vec![
                r"\s*\[Explicit\]".to_string(),
                r"\s*\(Explicit\)".to_string(),
                r"\s*- Remastered( \d{4})?".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub app_id: i64,

    /// Asset key shown as the large image
    pub large_image: String,

    /// Hover text of the large image
    #[serde(default)]
    pub large_text: Option<String>,

    /// Seconds to wait for the Discord client handshake
    pub handshake_timeout: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_DISCORD_APP_ID,
            large_image: "fb_1200x627".to_string(),
            large_text: None,
            handshake_timeout: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: 2,
            auth_poll_interval: default_auth_poll_interval(),
            session_file: None,
            player_process: Some("TIDAL.exe".to_string()),
            cleanup: CleanupConfig::default(),
            lastfm: LastFmConfig {
                api_key: String::new(),
                api_secret: String::new(),
            },
            discord: DiscordConfig::default(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;

        Ok(config_dir.join("scrobble_presence.conf"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, content).context("Failed to write config file")?;

        log::info!("Config saved to {:?}", config_path);

        Ok(())
    }

    /// Path of the credential file, falling back to ~/.session_key
    pub fn session_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }

        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".session_key"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval == 0 {
            anyhow::bail!("refresh_interval must be greater than 0");
        }

        if self.auth_poll_interval == 0 {
            anyhow::bail!("auth_poll_interval must be greater than 0");
        }

        if self.lastfm.api_key.is_empty() {
            anyhow::bail!("Last.fm api_key is required, get one at https://www.last.fm/api/account/create");
        }
        if self.lastfm.api_secret.is_empty() {
            anyhow::bail!("Last.fm api_secret is required");
        }

        if self.discord.large_image.is_empty() {
            log::warn!("No large image configured, the presence will show without artwork");
        }

        if self.player_process.as_deref() == Some("") {
            anyhow::bail!("player_process must not be empty, remove the key to disable the check");
        }

        Ok(())
    }
}
