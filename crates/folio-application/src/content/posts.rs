//! Blog post service.

use chrono::Utc;
use folio_core::content::{
    ContentFilter, POST_TAGS_TABLE, POSTS_TABLE, Post, PostDraft, PublishStatus, UploadPolicy,
};
use folio_core::store::{BlobStore, Filter, Query, RowStore, decode_row, decode_rows, encode_row};
use folio_core::{FolioError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ContentConfig, links, object_path, resolve_slug};

const POST_OWNER_COLUMN: &str = "post_id";

/// Creates, edits, lists and deletes blog posts.
pub struct PostService {
    rows: Arc<dyn RowStore>,
    blobs: Arc<dyn BlobStore>,
    image_bucket: String,
    image_policy: UploadPolicy,
}

impl PostService {
    pub fn new(rows: Arc<dyn RowStore>, blobs: Arc<dyn BlobStore>, config: &ContentConfig) -> Self {
        Self {
            rows,
            blobs,
            image_bucket: config.image_bucket.clone(),
            image_policy: UploadPolicy::images(),
        }
    }

    /// Published posts only, for anonymous visitors.
    pub async fn list_published(&self, filter: &ContentFilter) -> Result<Vec<Post>> {
        let filter = ContentFilter {
            status: Some(PublishStatus::Published),
            ..filter.clone()
        };
        self.list_all(&filter).await
    }

    /// Every post matching `filter`, drafts included.
    pub async fn list_all(&self, filter: &ContentFilter) -> Result<Vec<Post>> {
        let rows = self.rows.select(POSTS_TABLE, &Query::all()).await?;
        let posts: Vec<Post> = decode_rows(rows)?;
        let tags = if filter.tag_id.is_some() {
            links::link_index(self.rows.as_ref(), POST_TAGS_TABLE, POST_OWNER_COLUMN).await?
        } else {
            HashMap::new()
        };
        Ok(filter.apply(posts, &tags))
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        let row = self
            .rows
            .select_one(POSTS_TABLE, &Filter::eq_one("id", id))
            .await?;
        decode_row(row)
    }

    /// Looks up a published post by slug. Drafts are reported as not found.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Post> {
        let filter = Filter::eq_one("slug", slug).eq("status", PublishStatus::Published.to_string());
        let row = self.rows.select_one(POSTS_TABLE, &filter).await?;
        decode_row(row)
    }

    pub async fn tag_ids(&self, post_id: &str) -> Result<Vec<String>> {
        links::linked_tag_ids(self.rows.as_ref(), POST_TAGS_TABLE, POST_OWNER_COLUMN, post_id).await
    }

    /// Creates a post and links it to `tag_ids`.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty title or a slug already in use
    /// - Remote errors from the row store
    pub async fn create(&self, draft: PostDraft, tag_ids: &[String]) -> Result<Post> {
        let slug = resolve_slug(&draft.title, &draft.slug)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let post = Post {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            slug,
            excerpt: draft.excerpt,
            content: draft.content,
            cover_image_url: draft.cover_image_url,
            status: draft.status,
            category_id: draft.category_id,
            author_id: draft.author_id,
            published_at: (draft.status == PublishStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        let stored: Post = decode_row(self.rows.insert(POSTS_TABLE, encode_row(&post)?).await?)?;
        links::replace_links(
            self.rows.as_ref(),
            POST_TAGS_TABLE,
            POST_OWNER_COLUMN,
            &stored.id,
            tag_ids,
        )
        .await?;
        tracing::info!(post_id = %stored.id, slug = %stored.slug, "Post created");
        Ok(stored)
    }

    /// Replaces the editable fields and tag links of a post.
    ///
    /// `published_at` is set the first time a post is published and cleared
    /// when it goes back to draft.
    pub async fn update(&self, id: &str, draft: PostDraft, tag_ids: &[String]) -> Result<Post> {
        let existing = self.get(id).await?;
        let slug = resolve_slug(&draft.title, &draft.slug)?;
        if slug != existing.slug {
            self.ensure_slug_free(&slug, Some(id)).await?;
        }

        let now = Utc::now();
        let published_at = match draft.status {
            PublishStatus::Published => existing.published_at.or(Some(now)),
            PublishStatus::Draft => None,
        };
        let post = Post {
            title: draft.title.trim().to_string(),
            slug,
            excerpt: draft.excerpt,
            content: draft.content,
            cover_image_url: draft.cover_image_url,
            status: draft.status,
            category_id: draft.category_id,
            author_id: draft.author_id.or(existing.author_id),
            published_at,
            updated_at: now,
            ..existing
        };

        let row = self
            .rows
            .update(POSTS_TABLE, &Filter::eq_one("id", id), encode_row(&post)?)
            .await?;
        links::replace_links(self.rows.as_ref(), POST_TAGS_TABLE, POST_OWNER_COLUMN, id, tag_ids)
            .await?;
        tracing::info!(post_id = %id, "Post updated");
        decode_row(row)
    }

    /// Deletes a post and its tag links.
    pub async fn delete(&self, id: &str) -> Result<()> {
        links::remove_links(self.rows.as_ref(), POST_TAGS_TABLE, POST_OWNER_COLUMN, id).await?;
        let removed = self.rows.delete(POSTS_TABLE, &Filter::eq_one("id", id)).await?;
        if removed == 0 {
            return Err(FolioError::not_found(POSTS_TABLE, id));
        }
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Uploads a cover image and returns its public URL.
    pub async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let upload = self.image_policy.validate(file_name, bytes.len() as u64)?;
        let path = object_path("covers", &upload.file_name, &upload.extension);
        let stored = self
            .blobs
            .upload(&self.image_bucket, &path, bytes, &upload.content_type)
            .await?;
        Ok(self.blobs.public_url(&self.image_bucket, &stored))
    }

    async fn ensure_slug_free(&self, slug: &str, own_id: Option<&str>) -> Result<()> {
        let clashes = self
            .rows
            .select(POSTS_TABLE, &Query::filtered(Filter::eq_one("slug", slug)))
            .await?;
        let taken = clashes
            .iter()
            .any(|row| row.get("id").and_then(Value::as_str) != own_id);
        if taken {
            return Err(FolioError::validation(format!("slug '{}' is already in use", slug)));
        }
        Ok(())
    }
}
