//! Application configuration for gitscribe.
//!
//! User config lives at `~/.gitscribe/gitscribe.toml` and is optional.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GitScribeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "gitscribe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".gitscribe";

// ---------------------------------------------------------------------------
// Config structs (matching gitscribe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ollama settings for message generation.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Watch loop settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// `[ollama]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used to write commit messages.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_request_timeout() -> u64 {
    120
}

/// `[watch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds to sleep between polls.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    2
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings for the Ollama description generator.
#[derive(Debug, Clone)]
pub struct DescriberConfig {
    /// Ollama server base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl From<&AppConfig> for DescriberConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.ollama.base_url.clone(),
            model: config.ollama.model.clone(),
            request_timeout: Duration::from_secs(config.ollama.request_timeout_secs),
        }
    }
}

/// Runtime settings for the watch loop.
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    /// Fixed delay between ticks.
    pub interval: Duration,
}

impl From<&AppConfig> for WatchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.watch.interval_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.gitscribe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GitScribeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.gitscribe/gitscribe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GitScribeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        GitScribeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(?path, "loaded config file");
    Ok(config)
}

/// Check that a merged config is usable before any run starts.
pub fn validate(config: &AppConfig) -> Result<()> {
    let url = Url::parse(&config.ollama.base_url).map_err(|e| {
        GitScribeError::config(format!(
            "invalid Ollama base URL '{}': {e}",
            config.ollama.base_url
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GitScribeError::config(format!(
            "Ollama base URL must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.ollama.model.trim().is_empty() {
        return Err(GitScribeError::config("Ollama model name is empty"));
    }
    if config.ollama.request_timeout_secs == 0 {
        return Err(GitScribeError::config(
            "request_timeout_secs must be greater than zero",
        ));
    }
    if config.watch.interval_secs == 0 {
        return Err(GitScribeError::config(
            "watch interval_secs must be greater than zero",
        ));
    }

    Ok(())
}
