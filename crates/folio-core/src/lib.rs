//! Domain layer for Folio.
//!
//! Domain models, collaborator traits and the shared error type. Nothing in
//! this crate talks to a network or a file system.

pub mod content;
pub mod error;
pub mod identity;
pub mod profile;
pub mod session;
pub mod store;

// Re-export common error type
pub use error::{FolioError, Result};
