//! Folio configuration model.
//!
//! Loaded from `config.toml` and then overlaid with environment variables:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `FOLIO_BACKEND_URL` | `backend.url` |
//! | `FOLIO_BACKEND_ANON_KEY` | `backend.anon_key` |
//! | `FOLIO_LOG` | `log.level` |

use folio_core::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_BACKEND_URL: &str = "FOLIO_BACKEND_URL";
pub const ENV_BACKEND_ANON_KEY: &str = "FOLIO_BACKEND_ANON_KEY";
pub const ENV_LOG: &str = "FOLIO_LOG";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub backend: BackendConfig,
    pub session: SessionTimeouts,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

/// Hosted backend endpoint and its public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

/// Deadlines for remote session calls, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTimeouts {
    pub identity_timeout_secs: u64,
    pub profile_timeout_secs: u64,
    pub sign_in_timeout_secs: u64,
    pub sign_out_timeout_secs: u64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            identity_timeout_secs: 10,
            profile_timeout_secs: 10,
            sign_in_timeout_secs: 10,
            sign_out_timeout_secs: 3,
        }
    }
}

impl SessionTimeouts {
    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_timeout_secs)
    }

    pub fn sign_in_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_in_timeout_secs)
    }

    pub fn sign_out_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_out_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub resource_bucket: String,
    pub image_bucket: String,
    /// Base for public object URLs; derived from `backend.url` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resource_bucket: "resources".to_string(),
            image_bucket: "images".to_string(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FolioConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file missing, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Overlays values found through `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup(ENV_BACKEND_ANON_KEY) {
            self.backend.anon_key = Some(key);
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log.level = level;
        }
    }

    /// Overlays the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Checks that the backend is configured and every timeout is positive.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::Config` naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        let url = self
            .backend
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| FolioError::config(format!("backend.url is not set ({})", ENV_BACKEND_URL)))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FolioError::config(format!(
                "backend.url must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self
            .backend
            .anon_key
            .as_deref()
            .is_none_or(|key| key.trim().is_empty())
        {
            return Err(FolioError::config(format!(
                "backend.anon_key is not set ({})",
                ENV_BACKEND_ANON_KEY
            )));
        }

        let timeouts = [
            ("identity_timeout_secs", self.session.identity_timeout_secs),
            ("profile_timeout_secs", self.session.profile_timeout_secs),
            ("sign_in_timeout_secs", self.session.sign_in_timeout_secs),
            ("sign_out_timeout_secs", self.session.sign_out_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(FolioError::config(format!("session.{} must be positive", name)));
        }
        Ok(())
    }

    /// Base URL for public blob links.
    pub fn public_base_url(&self) -> String {
        if let Some(base) = &self.storage.public_base_url {
            return base.trim_end_matches('/').to_string();
        }
        let backend = self.backend.url.as_deref().unwrap_or("http://localhost");
        format!("{}/storage/v1/object/public", backend.trim_end_matches('/'))
    }
}
