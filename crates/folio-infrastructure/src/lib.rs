//! Infrastructure layer for Folio.
//!
//! Configuration loading, path resolution, logging setup and the in-memory
//! implementations of the auth, row-store and blob-store collaborators.

pub mod config;
pub mod config_service;
pub mod logging;
pub mod memory;
pub mod paths;
pub mod seed;

pub use crate::config::FolioConfig;
pub use crate::config_service::ConfigService;
pub use crate::memory::{InMemoryAuthService, InMemoryBlobStore, InMemoryRowStore};
pub use crate::paths::FolioPaths;
pub use crate::seed::Seed;
