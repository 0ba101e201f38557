//! Profile domain module.
//!
//! A profile is the row-store record that carries a user's display name and
//! role, keyed by the identity id.

mod model;

// Re-export public API
pub use model::{PROFILES_TABLE, Profile, ProfileUpdate, Role};
