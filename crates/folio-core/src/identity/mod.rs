//! Identity domain module.
//!
//! This module contains the authenticated principal handle and the
//! authentication collaborator interface.
//!
//! # Module Structure
//!
//! - `model`: `Identity`, credentials, sign-in outcomes and auth events
//! - `service`: `AuthService` trait implemented by auth backends
//!
//! # Usage
//!
//! ```ignore
//! use folio_core::identity::{AuthService, Credentials, Identity};
//! ```

mod model;
mod service;

// Re-export public API
pub use model::{
    AuthChange, AuthEventKind, AuthProvider, Credentials, Identity, SignInOutcome,
};
pub use service::{AuthService, AuthSubscription, SubscriptionId};
