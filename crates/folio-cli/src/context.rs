//! Wiring of configuration, collaborators and services for one invocation.

use anyhow::{Context, Result};
use folio_application::{
    ContentConfig, PostService, ResourceService, SessionConfig, SessionManager, TaxonomyService,
};
use folio_infrastructure::logging::init_tracing;
use folio_infrastructure::{
    ConfigService, FolioConfig, FolioPaths, InMemoryAuthService, InMemoryBlobStore,
    InMemoryRowStore, Seed,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AppContext {
    pub session: SessionManager,
    pub posts: PostService,
    pub resources: ResourceService,
    pub taxonomy: TaxonomyService,
}

impl AppContext {
    /// Loads and validates the config, installs logging and builds the
    /// services over in-memory collaborators populated from the seed.
    pub async fn load(config_path: Option<&Path>, seed_path: Option<&Path>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::new(path),
            None => ConfigService::at_default_path()?,
        };
        let config = config_service
            .get_config()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        config.validate()?;
        init_tracing(&config.log.level)?;

        let auth = Arc::new(InMemoryAuthService::new(
            config.backend.url.clone().unwrap_or_default(),
        ));
        let rows = Arc::new(InMemoryRowStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new(config.public_base_url()));

        if let Some(path) = resolve_seed(seed_path)? {
            let seed = Seed::load(&path)
                .await
                .with_context(|| format!("Failed to load seed {}", path.display()))?;
            seed.apply(&auth, &rows)?;
        }

        let content = content_config(&config);
        tracing::debug!(config = %config_service.path().display(), "Folio context ready");
        Ok(Self {
            session: SessionManager::new(auth.clone(), rows.clone(), session_config(&config)),
            posts: PostService::new(rows.clone(), blobs.clone(), &content),
            resources: ResourceService::new(rows.clone(), blobs, &content),
            taxonomy: TaxonomyService::new(rows),
        })
    }
}

/// An explicit seed must exist; the default one is optional.
fn resolve_seed(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    let default = FolioPaths::seed_file()?;
    Ok(default.exists().then_some(default))
}

pub fn session_config(config: &FolioConfig) -> SessionConfig {
    SessionConfig {
        identity_timeout: config.session.identity_timeout(),
        profile_timeout: config.session.profile_timeout(),
        sign_in_timeout: config.session.sign_in_timeout(),
        sign_out_timeout: config.session.sign_out_timeout(),
    }
}

pub fn content_config(config: &FolioConfig) -> ContentConfig {
    ContentConfig {
        resource_bucket: config.storage.resource_bucket.clone(),
        image_bucket: config.storage.image_bucket.clone(),
    }
}
