use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::sanitize::DEFAULT_CLOUD_LIMIT;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// The parsing backend that turns uploaded files into records.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_word_cloud_limit")]
    pub word_cloud_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            word_cloud_limit: default_word_cloud_limit(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_word_cloud_limit() -> usize {
    DEFAULT_CLOUD_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
    /// Also restore the current page across runs.
    #[serde(default)]
    pub persist_page: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
            persist_page: false,
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.view.page_size == 0 {
        anyhow::bail!("view.page_size must be > 0");
    }
    if config.view.word_cloud_limit == 0 {
        anyhow::bail!("view.word_cloud_limit must be > 0");
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }
    if !(config.backend.url.starts_with("http://") || config.backend.url.starts_with("https://")) {
        anyhow::bail!(
            "backend.url must be an http(s) URL, got '{}'",
            config.backend.url
        );
    }

    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        Ok(Config::minimal())
    }
}
