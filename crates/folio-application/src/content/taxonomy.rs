//! Categories and tags.

use folio_core::content::{
    CATEGORIES_TABLE, Category, POST_TAGS_TABLE, RESOURCE_TAGS_TABLE, TAGS_TABLE, Tag, slugify,
};
use folio_core::store::{Filter, Order, Query, RowStore, decode_row, decode_rows, encode_row};
use folio_core::{FolioError, Result};
use std::sync::Arc;

use super::links;

/// Maintains the category and tag vocabularies.
pub struct TaxonomyService {
    rows: Arc<dyn RowStore>,
}

impl TaxonomyService {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// All categories, sorted by name.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let query = Query::all().order_by("name", Order::Asc);
        decode_rows(self.rows.select(CATEGORIES_TABLE, &query).await?)
    }

    pub async fn create_category(&self, name: &str, description: Option<String>) -> Result<Category> {
        let (name, slug) = self.named_slug(CATEGORIES_TABLE, name).await?;
        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            slug,
            description,
        };
        let row = self
            .rows
            .insert(CATEGORIES_TABLE, encode_row(&category)?)
            .await?;
        tracing::info!(category_id = %category.id, "Category created");
        decode_row(row)
    }

    /// Deletes a category. Posts and resources keep a dangling `category_id`,
    /// which list filters treat as uncategorised.
    pub async fn delete_category(&self, id: &str) -> Result<()> {
        let removed = self
            .rows
            .delete(CATEGORIES_TABLE, &Filter::eq_one("id", id))
            .await?;
        if removed == 0 {
            return Err(FolioError::not_found(CATEGORIES_TABLE, id));
        }
        Ok(())
    }

    /// All tags, sorted by name.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let query = Query::all().order_by("name", Order::Asc);
        decode_rows(self.rows.select(TAGS_TABLE, &query).await?)
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag> {
        let (name, slug) = self.named_slug(TAGS_TABLE, name).await?;
        let tag = Tag {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            slug,
        };
        let row = self.rows.insert(TAGS_TABLE, encode_row(&tag)?).await?;
        tracing::info!(tag_id = %tag.id, "Tag created");
        decode_row(row)
    }

    /// Deletes a tag together with every post and resource link to it.
    pub async fn delete_tag(&self, id: &str) -> Result<()> {
        for table in [POST_TAGS_TABLE, RESOURCE_TAGS_TABLE] {
            self.rows.delete(table, &Filter::eq_one("tag_id", id)).await?;
        }
        let removed = self.rows.delete(TAGS_TABLE, &Filter::eq_one("id", id)).await?;
        if removed == 0 {
            return Err(FolioError::not_found(TAGS_TABLE, id));
        }
        Ok(())
    }

    pub async fn tags_for_post(&self, post_id: &str) -> Result<Vec<Tag>> {
        let ids = links::linked_tag_ids(self.rows.as_ref(), POST_TAGS_TABLE, "post_id", post_id)
            .await?;
        self.resolve_tags(&ids).await
    }

    pub async fn tags_for_resource(&self, resource_id: &str) -> Result<Vec<Tag>> {
        let ids = links::linked_tag_ids(
            self.rows.as_ref(),
            RESOURCE_TAGS_TABLE,
            "resource_id",
            resource_id,
        )
        .await?;
        self.resolve_tags(&ids).await
    }

    async fn resolve_tags(&self, ids: &[String]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.tags().await?;
        Ok(tags.into_iter().filter(|tag| ids.contains(&tag.id)).collect())
    }

    async fn named_slug(&self, table: &str, name: &str) -> Result<(String, String)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FolioError::validation("name must not be empty"));
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(FolioError::validation(format!(
                "cannot derive a slug from '{}'",
                name
            )));
        }
        let clashes = self
            .rows
            .select(table, &Query::filtered(Filter::eq_one("slug", slug.as_str())))
            .await?;
        if !clashes.is_empty() {
            return Err(FolioError::validation(format!("'{}' already exists", name)));
        }
        Ok((name.to_string(), slug))
    }
}
