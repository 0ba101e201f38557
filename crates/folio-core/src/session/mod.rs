//! Session domain module.
//!
//! The session is the process-local view of who is signed in. It is owned by
//! the application-layer session manager and handed to consumers as a
//! read-only snapshot.

mod model;

// Re-export public API
pub use model::{LoadingState, Session, SessionStatus};
