//! Downloadable resource service.

use chrono::Utc;
use folio_core::content::{
    ContentFilter, PublishStatus, RESOURCE_TAGS_TABLE, RESOURCES_TABLE, Resource, ResourceDraft,
    UploadPolicy,
};
use folio_core::store::{BlobStore, Filter, Query, Row, RowStore, decode_row, decode_rows, encode_row};
use folio_core::{FolioError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ContentConfig, links, object_path, resolve_slug};

const RESOURCE_OWNER_COLUMN: &str = "resource_id";

/// Manages downloadable files and their metadata rows.
///
/// The blob and the row are written in two steps; when the row insert fails
/// the freshly uploaded blob is removed again.
pub struct ResourceService {
    rows: Arc<dyn RowStore>,
    blobs: Arc<dyn BlobStore>,
    bucket: String,
    policy: UploadPolicy,
}

impl ResourceService {
    pub fn new(rows: Arc<dyn RowStore>, blobs: Arc<dyn BlobStore>, config: &ContentConfig) -> Self {
        Self {
            rows,
            blobs,
            bucket: config.resource_bucket.clone(),
            policy: UploadPolicy::documents(),
        }
    }

    /// Overrides the default document policy.
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn list_published(&self, filter: &ContentFilter) -> Result<Vec<Resource>> {
        let filter = ContentFilter {
            status: Some(PublishStatus::Published),
            ..filter.clone()
        };
        self.list_all(&filter).await
    }

    pub async fn list_all(&self, filter: &ContentFilter) -> Result<Vec<Resource>> {
        let rows = self.rows.select(RESOURCES_TABLE, &Query::all()).await?;
        let resources: Vec<Resource> = decode_rows(rows)?;
        let tags = if filter.tag_id.is_some() {
            links::link_index(self.rows.as_ref(), RESOURCE_TAGS_TABLE, RESOURCE_OWNER_COLUMN)
                .await?
        } else {
            HashMap::new()
        };
        Ok(filter.apply(resources, &tags))
    }

    pub async fn get(&self, id: &str) -> Result<Resource> {
        let row = self
            .rows
            .select_one(RESOURCES_TABLE, &Filter::eq_one("id", id))
            .await?;
        decode_row(row)
    }

    pub async fn tag_ids(&self, resource_id: &str) -> Result<Vec<String>> {
        links::linked_tag_ids(
            self.rows.as_ref(),
            RESOURCE_TAGS_TABLE,
            RESOURCE_OWNER_COLUMN,
            resource_id,
        )
        .await
    }

    /// Validates and uploads `bytes`, then records the resource row.
    ///
    /// # Errors
    ///
    /// - `Validation` for empty titles, taken slugs and rejected files
    /// - Remote errors from either store
    pub async fn create(
        &self,
        draft: ResourceDraft,
        file_name: &str,
        bytes: Vec<u8>,
        tag_ids: &[String],
    ) -> Result<Resource> {
        let slug = resolve_slug(&draft.title, &draft.slug)?;
        let upload = self.policy.validate(file_name, bytes.len() as u64)?;
        self.ensure_slug_free(&slug).await?;

        let path = object_path(&slug, &upload.file_name, &upload.extension);
        let stored_path = self
            .blobs
            .upload(&self.bucket, &path, bytes, &upload.content_type)
            .await?;

        let now = Utc::now();
        let resource = Resource {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            slug,
            description: draft.description,
            file_path: stored_path.clone(),
            file_name: upload.file_name,
            file_size: upload.size,
            mime_type: upload.content_type,
            status: draft.status,
            category_id: draft.category_id,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };

        let inserted = match self.insert_row(&resource).await {
            Ok(inserted) => inserted,
            Err(err) => {
                if let Err(cleanup) = self.blobs.remove(&self.bucket, &[stored_path]).await {
                    tracing::warn!(error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(err);
            }
        };

        links::replace_links(
            self.rows.as_ref(),
            RESOURCE_TAGS_TABLE,
            RESOURCE_OWNER_COLUMN,
            &inserted.id,
            tag_ids,
        )
        .await?;
        tracing::info!(resource_id = %inserted.id, path = %inserted.file_path, "Resource created");
        Ok(inserted)
    }

    /// Updates metadata and tag links. The file itself is immutable.
    pub async fn update(&self, id: &str, draft: ResourceDraft, tag_ids: &[String]) -> Result<Resource> {
        let existing = self.get(id).await?;
        let slug = resolve_slug(&draft.title, &draft.slug)?;
        if slug != existing.slug {
            self.ensure_slug_free(&slug).await?;
        }

        let mut fields = Row::new();
        fields.insert("title".to_string(), Value::from(draft.title.trim()));
        fields.insert("slug".to_string(), Value::from(slug));
        fields.insert(
            "description".to_string(),
            draft.description.map(Value::from).unwrap_or(Value::Null),
        );
        fields.insert("status".to_string(), Value::from(draft.status.to_string()));
        fields.insert(
            "category_id".to_string(),
            draft.category_id.map(Value::from).unwrap_or(Value::Null),
        );
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        let row = self
            .rows
            .update(RESOURCES_TABLE, &Filter::eq_one("id", id), fields)
            .await?;
        links::replace_links(
            self.rows.as_ref(),
            RESOURCE_TAGS_TABLE,
            RESOURCE_OWNER_COLUMN,
            id,
            tag_ids,
        )
        .await?;
        decode_row(row)
    }

    /// Deletes the row, its tag links and the stored file.
    ///
    /// A failure to remove the file is logged; the row is already gone.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let resource = self.get(id).await?;
        links::remove_links(self.rows.as_ref(), RESOURCE_TAGS_TABLE, RESOURCE_OWNER_COLUMN, id)
            .await?;
        self.rows
            .delete(RESOURCES_TABLE, &Filter::eq_one("id", id))
            .await?;
        if let Err(err) = self
            .blobs
            .remove(&self.bucket, &[resource.file_path.clone()])
            .await
        {
            tracing::warn!(resource_id = %id, error = %err, "Failed to remove resource file");
        }
        tracing::info!(resource_id = %id, "Resource deleted");
        Ok(())
    }

    /// Counts a download of a published resource and returns its URL.
    ///
    /// The counter is bumped by the store in one step, so concurrent
    /// downloads are all counted.
    pub async fn record_download(&self, id: &str) -> Result<String> {
        let resource = self.get(id).await?;
        if resource.status != PublishStatus::Published {
            return Err(FolioError::not_found(RESOURCES_TABLE, id));
        }

        self.rows
            .increment(RESOURCES_TABLE, &Filter::eq_one("id", id), "download_count", 1)
            .await?;
        Ok(self.blobs.public_url(&self.bucket, &resource.file_path))
    }

    async fn insert_row(&self, resource: &Resource) -> Result<Resource> {
        let row = self.rows.insert(RESOURCES_TABLE, encode_row(resource)?).await?;
        decode_row(row)
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<()> {
        let clashes = self
            .rows
            .select(RESOURCES_TABLE, &Query::filtered(Filter::eq_one("slug", slug)))
            .await?;
        if !clashes.is_empty() {
            return Err(FolioError::validation(format!("slug '{}' is already in use", slug)));
        }
        Ok(())
    }
}
