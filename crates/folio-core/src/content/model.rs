//! Content row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const POSTS_TABLE: &str = "posts";
pub const RESOURCES_TABLE: &str = "resources";
pub const CATEGORIES_TABLE: &str = "categories";
pub const TAGS_TABLE: &str = "tags";
pub const POST_TAGS_TABLE: &str = "post_tags";
pub const RESOURCE_TAGS_TABLE: &str = "resource_tags";

/// Visibility of a post or resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
}

/// A blog post row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable post fields, as submitted by the admin form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    /// Generated from `title` when empty
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
}

/// A downloadable resource row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Object path inside the resource bucket
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable resource fields. File metadata is filled in by the upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}
