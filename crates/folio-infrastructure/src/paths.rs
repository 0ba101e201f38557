//! Path management for folio configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/folio/             # Config directory (platform config dir)
//! ├── config.toml              # Application configuration
//! └── seed.json                # Default seed for the in-memory backend
//! ```

use folio_core::{FolioError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "folio";

/// Resolves folio paths under the platform configuration directory.
pub struct FolioPaths;

impl FolioPaths {
    /// Returns the folio configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/folio/`)
    /// - `Err(FolioError::Config)`: The platform has no config directory
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| FolioError::config("cannot determine the config directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the default seed file.
    pub fn seed_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("seed.json"))
    }
}
