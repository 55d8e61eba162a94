use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::api::client::ClientConfig;

pub const API_URL_ENV: &str = "CONTACT_BOOK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid API URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Contacts resource, e.g. `http://localhost:8080/contacts`.
    pub api_url: String,
    pub search_debounce_ms: u64,
    /// 0 disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/contacts".to_string(),
            search_debounce_ms: 300,
            request_timeout_secs: 10,
        }
    }
}

impl AppSettings {
    pub fn settings_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "ContactBook")?;
        Some(proj.config_dir().join("settings.toml"))
    }

    /// Settings from the default location with environment overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = match Self::settings_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(settings.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::settings_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let normalized = crate::utils::normalize_url(&self.api_url);
        let invalid = |reason: String| ConfigError::InvalidApiUrl { url: self.api_url.clone(), reason };
        let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        Ok(url)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig { base_url: self.api_url()?, timeout: self.timeout() })
    }
}
