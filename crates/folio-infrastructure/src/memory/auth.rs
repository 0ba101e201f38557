use async_trait::async_trait;
use folio_core::identity::{
    AuthChange, AuthEventKind, AuthService, AuthSubscription, Credentials, Identity,
    SignInOutcome, SubscriptionId,
};
use folio_core::{FolioError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

struct Account {
    identity: Identity,
    password: String,
}

#[derive(Default)]
struct AuthState {
    /// Keyed by lowercased email
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<AuthChange>>,
    next_subscription: u64,
}

/// Password and OAuth auth backend held in memory.
///
/// Password sign-in resolves immediately and publishes a `SignedIn` change to
/// every subscriber, like the hosted backend does. OAuth sign-in only returns
/// the authorize URL.
pub struct InMemoryAuthService {
    state: Mutex<AuthState>,
    base_url: String,
}

impl InMemoryAuthService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(AuthState::default()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an account. Re-registering an email replaces it.
    pub fn add_account(&self, id: impl Into<String>, email: &str, password: &str) -> Identity {
        let identity = Identity::new(id, Some(email.to_string()));
        self.state().accounts.insert(
            email.to_lowercase(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        identity
    }

    pub fn current(&self) -> Option<Identity> {
        self.state().current.clone()
    }

    /// Replaces the current session without a sign-in call and publishes the
    /// change, as a token refresh or another tab would.
    pub fn set_current(&self, identity: Option<Identity>) {
        let kind = match &identity {
            Some(_) => AuthEventKind::SignedIn,
            None => AuthEventKind::SignedOut,
        };
        self.publish(identity, kind);
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    fn publish(&self, identity: Option<Identity>, kind: AuthEventKind) {
        let mut state = self.state();
        state.current = identity.clone();
        let change = AuthChange { kind, identity };
        state
            .subscribers
            .retain(|_, sender| sender.send(change.clone()).is_ok());
    }

    fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        let mut url = format!("{}/auth/v1/authorize?provider={}", self.base_url, provider);
        if let Some(redirect_to) = redirect_to {
            url.push_str("&redirect_to=");
            url.push_str(redirect_to);
        }
        url
    }
}

#[async_trait]
impl AuthService for InMemoryAuthService {
    async fn get_session(&self) -> Result<Option<Identity>> {
        Ok(self.current())
    }

    fn subscribe(&self) -> AuthSubscription {
        let (sender, events) = mpsc::unbounded_channel();
        let mut state = self.state();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state.subscribers.insert(id, sender);
        AuthSubscription {
            id: SubscriptionId(id),
            events,
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state().subscribers.remove(&id.0);
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome> {
        match credentials {
            Credentials::Password { email, password } => {
                let identity = {
                    let state = self.state();
                    state
                        .accounts
                        .get(&email.to_lowercase())
                        .filter(|account| account.password == *password)
                        .map(|account| account.identity.clone())
                }
                .ok_or_else(|| FolioError::remote("sign_in", "Invalid login credentials"))?;

                tracing::debug!(user_id = %identity.id, "In-memory sign in");
                self.publish(Some(identity.clone()), AuthEventKind::SignedIn);
                Ok(SignInOutcome::Authenticated(identity))
            }
            Credentials::OAuth {
                provider,
                redirect_to,
            } => Ok(SignInOutcome::Redirect {
                url: self.authorize_url(&provider.to_string(), redirect_to.as_deref()),
            }),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.publish(None, AuthEventKind::SignedOut);
        Ok(())
    }
}
