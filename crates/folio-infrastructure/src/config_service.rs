//! Configuration service implementation.
//!
//! Loads the [`FolioConfig`] from `config.toml` (by default
//! `~/.config/folio/config.toml`), overlays the process environment and caches
//! the result.

use crate::config::FolioConfig;
use crate::paths::FolioPaths;
use folio_core::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, filled on first access.
    config: Arc<RwLock<Option<FolioConfig>>>,
    use_process_env: bool,
}

impl ConfigService {
    /// Creates a service reading `path`. Nothing is read until first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
            use_process_env: true,
        }
    }

    /// Creates a service for the default config file location.
    pub fn at_default_path() -> Result<Self> {
        Ok(Self::new(FolioPaths::config_file()?))
    }

    /// Disables the environment overlay, so only the file is read.
    pub fn without_env(mut self) -> Self {
        self.use_process_env = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it if not cached.
    ///
    /// Unlike a missing file, a malformed file is an error and is not cached.
    pub fn get_config(&self) -> Result<FolioConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let mut loaded = FolioConfig::load_from(&self.path)?;
        if self.use_process_env {
            loaded.apply_process_env();
        }
        tracing::debug!(path = %self.path.display(), "Loaded folio config");

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Writes `config` to disk and replaces the cached copy.
    pub fn save(&self, config: &FolioConfig) -> Result<()> {
        config.save_to(&self.path)?;
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }
}
