//! Content application services.
//!
//! CRUD for posts, resources, categories and tags on top of the injected
//! row-store and blob-store collaborators.

mod links;
mod posts;
mod resources;
mod taxonomy;

pub use posts::PostService;
pub use resources::ResourceService;
pub use taxonomy::TaxonomyService;

/// Bucket names used by the content services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    pub resource_bucket: String,
    pub image_bucket: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            resource_bucket: "resources".to_string(),
            image_bucket: "images".to_string(),
        }
    }
}

/// Builds an object path `<prefix>/<uuid>-<slugified stem>.<ext>`.
pub(crate) fn object_path(prefix: &str, file_name: &str, extension: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(folio_core::content::slugify)
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "file".to_string());
    format!("{}/{}-{}.{}", prefix, uuid::Uuid::new_v4(), stem, extension)
}

/// Resolves the slug for a draft: explicit slug if given, else the title.
pub(crate) fn resolve_slug(title: &str, explicit: &str) -> folio_core::Result<String> {
    if title.trim().is_empty() {
        return Err(folio_core::FolioError::validation("title must not be empty"));
    }
    let source = if explicit.trim().is_empty() { title } else { explicit };
    let slug = folio_core::content::slugify(source);
    if slug.is_empty() {
        return Err(folio_core::FolioError::validation(format!(
            "cannot derive a slug from '{}'",
            source
        )));
    }
    Ok(slug)
}
