//! Content domain module.
//!
//! Blog posts, downloadable resources and the category/tag taxonomy, plus the
//! pure helpers the content services build on.
//!
//! # Module Structure
//!
//! - `model`: Row models and drafts (`Post`, `Resource`, `Category`, `Tag`)
//! - `slug`: URL slug generation
//! - `upload`: File type and size validation
//! - `filter`: In-memory list filtering and sorting

mod filter;
mod model;
mod slug;
mod upload;

// Re-export public API
pub use filter::{ContentFilter, Listable, SortOrder};
pub use model::{
    CATEGORIES_TABLE, Category, POST_TAGS_TABLE, POSTS_TABLE, Post, PostDraft, PublishStatus,
    RESOURCE_TAGS_TABLE, RESOURCES_TABLE, Resource, ResourceDraft, TAGS_TABLE, Tag,
};
pub use slug::slugify;
pub use upload::{UploadPolicy, ValidatedUpload};
