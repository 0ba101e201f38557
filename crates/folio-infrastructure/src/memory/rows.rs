use async_trait::async_trait;
use folio_core::store::{Filter, Query, Row, RowStore};
use folio_core::{FolioError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Table-of-rows store held in memory.
///
/// Inserted rows get an `id` (UUID v4) and `created_at` / `updated_at`
/// timestamps when they do not carry them already.
#[derive(Default)]
pub struct InMemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    /// Tables rejecting writes, for exercising error paths
    read_only: RwLock<HashSet<String>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends rows as given, without generating columns.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Copy of every row in `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.read().get(table).cloned().unwrap_or_default()
    }

    /// Makes inserts, updates and deletes against `table` fail (or succeed
    /// again). Selects keep working.
    pub fn set_read_only(&self, table: &str, read_only: bool) {
        let mut tables = self.read_only.write().unwrap_or_else(PoisonError::into_inner);
        if read_only {
            tables.insert(table.to_string());
        } else {
            tables.remove(table);
        }
    }

    fn check_writable(&self, operation: &str, table: &str) -> Result<()> {
        let tables = self.read_only.read().unwrap_or_else(PoisonError::into_inner);
        if tables.contains(table) {
            return Err(FolioError::remote(
                operation,
                format!("table '{}' is read-only", table),
            ));
        }
        Ok(())
    }
}

fn now_value() -> Result<Value> {
    Ok(serde_json::to_value(chrono::Utc::now())?)
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        let matching = self
            .read()
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.finish(matching))
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Row> {
        self.read()
            .get(table)
            .and_then(|rows| rows.iter().find(|row| filter.matches(row)).cloned())
            .ok_or_else(|| FolioError::not_found(table, filter.describe()))
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        self.check_writable("insert", table)?;
        let now = now_value()?;
        if row.get("id").is_none_or(Value::is_null) {
            row.insert("id".to_string(), Value::from(uuid::Uuid::new_v4().to_string()));
        }
        for column in ["created_at", "updated_at"] {
            if row.get(column).is_none_or(Value::is_null) {
                row.insert(column.to_string(), now.clone());
            }
        }

        let mut tables = self.write();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|existing| existing.get("id") == row.get("id")) {
            return Err(FolioError::remote(
                "insert",
                format!("duplicate key in '{}': id={}", table, row["id"]),
            ));
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filter: &Filter, fields: Row) -> Result<Row> {
        self.check_writable("update", table)?;
        let mut tables = self.write();
        let mut updated: Option<Row> = None;
        for row in tables.get_mut(table).into_iter().flatten() {
            if filter.matches(row) {
                for (column, value) in &fields {
                    row.insert(column.clone(), value.clone());
                }
                if updated.is_none() {
                    updated = Some(row.clone());
                }
            }
        }
        updated.ok_or_else(|| FolioError::not_found(table, filter.describe()))
    }

    async fn increment(&self, table: &str, filter: &Filter, column: &str, by: i64) -> Result<Row> {
        self.check_writable("increment", table)?;
        let mut tables = self.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| filter.matches(row)))
            .ok_or_else(|| FolioError::not_found(table, filter.describe()))?;
        let current = match row.get(column) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                FolioError::remote(
                    "increment",
                    format!("column '{}' of '{}' is not an integer", column, table),
                )
            })?,
        };
        row.insert(column.to_string(), Value::from(current + by));
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        self.check_writable("delete", table)?;
        let mut tables = self.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::store::Order;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_generates_columns() {
        let store = InMemoryRowStore::new();
        let stored = store.insert("tags", row(json!({"name": "rust"}))).await.unwrap();
        assert!(stored["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(stored["created_at"].is_string());
        assert_eq!(store.rows("tags"), vec![stored]);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryRowStore::new();
        store.insert("tags", row(json!({"id": "t1"}))).await.unwrap();
        let err = store.insert("tags", row(json!({"id": "t1"}))).await.unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_select_one_missing_is_not_found() {
        let store = InMemoryRowStore::new();
        let err = store
            .select_one("profiles", &Filter::eq_one("id", "ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let store = InMemoryRowStore::new();
        store.seed(
            "tags",
            [
                row(json!({"id": "1", "name": "b", "kind": "x"})),
                row(json!({"id": "2", "name": "a", "kind": "x"})),
                row(json!({"id": "3", "name": "c", "kind": "y"})),
            ],
        );
        let query = Query::filtered(Filter::eq_one("kind", "x")).order_by("name", Order::Asc);
        let names: Vec<_> = store
            .select("tags", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn test_update_merges_and_delete_counts() {
        let store = InMemoryRowStore::new();
        store.seed("profiles", [row(json!({"id": "u1", "full_name": "Ada", "role": "admin"}))]);

        let updated = store
            .update(
                "profiles",
                &Filter::eq_one("id", "u1"),
                row(json!({"full_name": "Ada L."})),
            )
            .await
            .unwrap();
        assert_eq!(updated["full_name"], json!("Ada L."));
        assert_eq!(updated["role"], json!("admin"));

        let missing = store
            .update("profiles", &Filter::eq_one("id", "u2"), Row::new())
            .await
            .unwrap_err();
        assert!(missing.is_not_found());

        assert_eq!(store.delete("profiles", &Filter::eq_one("id", "u1")).await.unwrap(), 1);
        assert_eq!(store.delete("nothing", &Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_counts_every_call() {
        let store = std::sync::Arc::new(InMemoryRowStore::new());
        store.seed("resources", [row(json!({"id": "r1", "title": "Guide"}))]);

        let calls: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .increment("resources", &Filter::eq_one("id", "r1"), "download_count", 1)
                        .await
                })
            })
            .collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }

        let stored = store.rows("resources");
        assert_eq!(stored[0]["download_count"], json!(8));
        assert_eq!(stored[0]["title"], json!("Guide"));
    }

    #[tokio::test]
    async fn test_increment_rejects_missing_row_and_text_column() {
        let store = InMemoryRowStore::new();
        store.seed("resources", [row(json!({"id": "r1", "title": "Guide"}))]);

        let err = store
            .increment("resources", &Filter::eq_one("id", "r2"), "download_count", 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .increment("resources", &Filter::eq_one("id", "r1"), "title", 1)
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_read_only_table_rejects_writes() {
        let store = InMemoryRowStore::new();
        store.set_read_only("posts", true);
        let err = store.insert("posts", Row::new()).await.unwrap_err();
        assert!(err.is_remote());
        assert!(store.select("posts", &Query::all()).await.unwrap().is_empty());

        store.set_read_only("posts", false);
        assert!(store.insert("posts", Row::new()).await.is_ok());
    }
}
