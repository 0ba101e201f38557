//! Identity domain model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The authenticated principal as reported by the auth collaborator.
///
/// Distinct from [`crate::profile::Profile`], which is the domain record
/// keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id issued by the auth backend
    pub id: String,
    /// Email address, if the provider exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// External OAuth providers the portal can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Github,
}

/// Credentials accepted by [`super::AuthService::sign_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Email + password sign in, resolves directly with an identity
    Password { email: String, password: String },
    /// Begins an OAuth flow with the given provider
    OAuth {
        provider: AuthProvider,
        redirect_to: Option<String>,
    },
}

/// Result of a successful sign-in request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignInOutcome {
    /// The backend authenticated the user immediately
    Authenticated(Identity),
    /// The caller must follow `url` to finish an external flow
    Redirect { url: String },
}

/// Kind of identity change published by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// An identity-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    /// The identity after the change; `None` once signed out
    pub identity: Option<Identity>,
}

impl AuthChange {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            identity: None,
        }
    }
}
