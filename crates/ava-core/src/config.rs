use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::message::ChatContext;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the backend's `session` cookie, copied from a signed-in browser
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub default_context: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            default_context: None,
            log_level: None,
        }
    }

    /// Load from the config file, then apply `AVA_BASE_URL` / `AVA_SESSION`
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_overrides(
            std::env::var("AVA_BASE_URL").ok(),
            std::env::var("AVA_SESSION").ok(),
        );
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Remember the last selected context without persisting env overrides
    pub fn save_default_context(context: ChatContext) -> Result<()> {
        let path = Self::get_config_path()?;
        let mut config = Self::load_from(&path).unwrap_or_else(|_| Self::new());
        config.default_context = Some(context.as_str().to_string());
        config.save_to(&path)
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, session_cookie: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(cookie) = session_cookie.filter(|c| !c.trim().is_empty()) {
            self.session_cookie = Some(cookie);
        }
    }

    /// Context to open with; unknown names fall back to Onboarding
    pub fn context(&self) -> ChatContext {
        self.default_context
            .as_deref()
            .and_then(ChatContext::from_str)
            .unwrap_or_default()
    }

    /// Where the browser goes to end the session
    pub fn logout_url(&self) -> String {
        format!("{}/logout", self.base_url.trim_end_matches('/'))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ava-chat").join("config.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
