//! Authentication collaborator trait.
//!
//! Defines the interface the session manager consumes from an auth backend.

use super::model::{AuthChange, Credentials, Identity, SignInOutcome};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Handle identifying one identity-change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live identity-change subscription.
///
/// Events are delivered on `events` until [`AuthService::unsubscribe`] is
/// called with `id` or the backend is dropped.
#[derive(Debug)]
pub struct AuthSubscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<AuthChange>,
}

/// An abstract authentication backend.
///
/// This trait decouples the session manager from the hosted identity
/// provider. Implementations own token storage and refresh; callers only see
/// [`Identity`] handles.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Returns the identity of the current session, if any.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(identity))`: A session exists
    /// - `Ok(None)`: Nobody is signed in
    /// - `Err(_)`: The backend could not be reached
    async fn get_session(&self) -> Result<Option<Identity>>;

    /// Registers for identity-change notifications.
    fn subscribe(&self) -> AuthSubscription;

    /// Deregisters a subscription created by [`AuthService::subscribe`].
    fn unsubscribe(&self, id: SubscriptionId);

    /// Starts or completes a sign-in.
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome>;

    /// Ends the remote session.
    async fn sign_out(&self) -> Result<()>;
}
