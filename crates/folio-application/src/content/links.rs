//! Tag join-table helpers shared by posts and resources.

use folio_core::Result;
use folio_core::store::{Filter, Query, Row, RowStore};
use serde_json::Value;
use std::collections::HashMap;

/// Replaces every tag link of `owner_id` with `tag_ids` (duplicates dropped).
pub(crate) async fn replace_links(
    rows: &dyn RowStore,
    table: &str,
    owner_column: &str,
    owner_id: &str,
    tag_ids: &[String],
) -> Result<()> {
    rows.delete(table, &Filter::eq_one(owner_column, owner_id))
        .await?;

    let mut seen: Vec<&str> = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        if seen.contains(&tag_id.as_str()) {
            continue;
        }
        seen.push(tag_id);
        let mut link = Row::new();
        link.insert(owner_column.to_string(), Value::from(owner_id));
        link.insert("tag_id".to_string(), Value::from(tag_id.as_str()));
        rows.insert(table, link).await?;
    }
    Ok(())
}

/// Removes every link of `owner_id`.
pub(crate) async fn remove_links(
    rows: &dyn RowStore,
    table: &str,
    owner_column: &str,
    owner_id: &str,
) -> Result<u64> {
    rows.delete(table, &Filter::eq_one(owner_column, owner_id))
        .await
}

/// Tag ids linked to `owner_id`.
pub(crate) async fn linked_tag_ids(
    rows: &dyn RowStore,
    table: &str,
    owner_column: &str,
    owner_id: &str,
) -> Result<Vec<String>> {
    let links = rows
        .select(table, &Query::filtered(Filter::eq_one(owner_column, owner_id)))
        .await?;
    Ok(links
        .iter()
        .filter_map(|link| link.get("tag_id").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Owner id to tag ids, for every link in `table`.
pub(crate) async fn link_index(
    rows: &dyn RowStore,
    table: &str,
    owner_column: &str,
) -> Result<HashMap<String, Vec<String>>> {
    let links = rows.select(table, &Query::all()).await?;
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for link in &links {
        let owner = link.get(owner_column).and_then(Value::as_str);
        let tag = link.get("tag_id").and_then(Value::as_str);
        if let (Some(owner), Some(tag)) = (owner, tag) {
            index.entry(owner.to_string()).or_default().push(tag.to_string());
        }
    }
    Ok(index)
}
