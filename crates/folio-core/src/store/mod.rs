//! Storage collaborator interfaces.
//!
//! # Module Structure
//!
//! - `query`: `Row`, `Filter` and `Query` value types
//! - `row_store`: `RowStore` trait for relational CRUD
//! - `blob_store`: `BlobStore` trait for file objects

mod blob_store;
mod query;
mod row_store;

// Re-export public API
pub use blob_store::BlobStore;
pub use query::{Filter, Order, Query, Row, decode_row, decode_rows, encode_row};
pub use row_store::RowStore;
