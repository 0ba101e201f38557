//! Row-store collaborator trait.

use super::query::{Filter, Query, Row};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract relational row store.
///
/// Rows are untyped JSON objects; typed models are decoded by the caller with
/// [`super::decode_row`].
///
/// # Implementation Notes
///
/// - `select_one` must return [`crate::FolioError::NotFound`] when no row
///   matches. Callers rely on that variant to tell a missing row apart from a
///   failed request.
/// - `update` returns the row as stored after the update.
/// - `increment` must apply the read and the write as one step, so that
///   concurrent increments are never lost.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Returns every row of `table` matching the query.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>>;

    /// Returns the single row matching `filter`.
    ///
    /// # Returns
    ///
    /// - `Ok(row)`: Exactly one match (the first, if several)
    /// - `Err(FolioError::NotFound)`: No row matched
    /// - `Err(_)`: The request failed
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Row>;

    /// Inserts a row and returns it as stored (with generated columns).
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Merges `fields` into the row matching `filter`.
    async fn update(&self, table: &str, filter: &Filter, fields: Row) -> Result<Row>;

    /// Deletes all rows matching `filter` and returns how many were removed.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64>;

    /// Adds `by` to the integer `column` of the row matching `filter`.
    ///
    /// A missing or null column counts as zero.
    ///
    /// # Returns
    ///
    /// - `Ok(row)`: The row as stored after the increment
    /// - `Err(FolioError::NotFound)`: No row matched
    /// - `Err(_)`: The column is not an integer, or the request failed
    async fn increment(&self, table: &str, filter: &Filter, column: &str, by: i64) -> Result<Row>;
}
