//! Application layer for Folio.
//!
//! This crate provides the services that coordinate the domain types in
//! `folio-core` with the injected auth, row-store and blob-store
//! collaborators: the session manager and the content services.

pub mod content;
pub mod session;

pub use content::{ContentConfig, PostService, ResourceService, TaxonomyService};
pub use session::{SessionConfig, SessionManager};
