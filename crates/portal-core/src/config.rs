//! Local client configuration.
//!
//! This module handles loading and saving the client configuration: the
//! backend URL, which application config to request, the last email used
//! to sign in and where durable tokens are kept.
//!
//! Configuration is stored at `~/.config/portal/config.json`.
//! `PORTAL_API_URL` and `PORTAL_APP_ID` override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::auth::{FileStorage, KeyringStorage, StorageBackend, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "portal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_ID: &str = "admin-portal";

pub const ENV_API_URL: &str = "PORTAL_API_URL";
pub const ENV_APP_ID: &str = "PORTAL_APP_ID";

/// Where "remember me" tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub app_id: String,
    pub last_email: Option<String>,
    pub token_storage: TokenStorageKind,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            last_email: None,
            token_storage: TokenStorageKind::File,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path)?;
        Ok(config.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_APP_ID).ok(),
        ))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Non-empty values replace the configured ones.
    pub fn with_overrides(mut self, api_base_url: Option<String>, app_id: Option<String>) -> Self {
        if let Some(url) = api_base_url.filter(|s| !s.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(id) = app_id.filter(|s| !s.trim().is_empty()) {
            self.app_id = id;
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Durable token directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Session-scoped token directory: the per-user runtime dir where the
    /// platform has one (cleared on logout/reboot), otherwise a directory
    /// under the user's cache dir. The shared temp dir is a last resort;
    /// `FileStorage` refuses to write there if another user owns the path.
    pub fn session_dir(&self) -> PathBuf {
        if let Some(runtime) = dirs::runtime_dir() {
            return runtime.join(format!("{}-session", APP_NAME));
        }
        dirs::cache_dir()
            .map(|cache| cache.join(APP_NAME).join("session"))
            .unwrap_or_else(|| std::env::temp_dir().join(format!("{}-session", APP_NAME)))
    }

    pub fn durable_storage(&self) -> Result<Box<dyn StorageBackend>> {
        Ok(match self.token_storage {
            TokenStorageKind::File => Box::new(FileStorage::new(self.cache_dir()?)),
            TokenStorageKind::Keyring => Box::new(KeyringStorage::new(APP_NAME)),
        })
    }

    /// Token store wired to the configured durable tier and the session dir.
    pub fn token_store(&self) -> Result<TokenStore> {
        let durable = self.durable_storage()?;
        let ephemeral = Box::new(FileStorage::new(self.session_dir()));
        Ok(TokenStore::new(durable, ephemeral))
    }
}
