//! Client config load/save for `~/.review-chat/config.yaml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::SUGGESTED_PROMPTS;

/// Environment variable naming the API base URL. Also read at build time.
pub const API_BASE_ENV: &str = "REVIEW_CHAT_API_BASE";

/// API base captured when the crate was compiled, if any.
pub const BUILD_API_BASE: Option<&str> = option_env!("REVIEW_CHAT_API_BASE");

/// API section (base_url, timeout_secs).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ApiSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// UI section (prefs_path, suggested_prompts).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs_path: Option<PathBuf>,
    #[serde(default = "default_suggested_prompts")]
    pub suggested_prompts: Vec<String>,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            prefs_path: None,
            suggested_prompts: default_suggested_prompts(),
        }
    }
}

fn default_suggested_prompts() -> Vec<String> {
    SUGGESTED_PROMPTS.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub ui: UiSection,
}

impl Config {
    /// First non-empty of: explicit override, runtime env, config file, build-time env.
    pub fn resolve_api_base(&self, override_url: Option<&str>) -> Option<String> {
        let runtime_env = std::env::var(API_BASE_ENV).ok();
        let base = [
            override_url,
            runtime_env.as_deref(),
            self.api.base_url.as_deref(),
            BUILD_API_BASE,
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string);
        base
    }
}

/// Returns the default config file path: `~/.review-chat/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".review-chat").join("config.yaml"))
}

/// Load config from a YAML file. An empty file yields the defaults.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(&contents)?)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
