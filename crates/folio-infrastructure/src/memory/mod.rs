//! In-memory collaborators.
//!
//! Process-local implementations of [`folio_core::identity::AuthService`],
//! [`folio_core::store::RowStore`] and [`folio_core::store::BlobStore`] used
//! by tests, local development and the CLI.

mod auth;
mod blobs;
mod rows;

pub use auth::InMemoryAuthService;
pub use blobs::{InMemoryBlobStore, StoredObject};
pub use rows::InMemoryRowStore;
