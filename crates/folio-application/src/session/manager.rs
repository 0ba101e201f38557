use folio_core::identity::{AuthService, Credentials, Identity, SignInOutcome, SubscriptionId};
use folio_core::profile::{PROFILES_TABLE, Profile, ProfileUpdate};
use folio_core::session::{Session, SessionStatus};
use folio_core::store::{Filter, RowStore};
use folio_core::{FolioError, Result};
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::SessionConfig;
use super::deadline::with_deadline;
use super::single_flight::{FlightRole, SingleFlight};

/// Owns the current user, their profile and the loading/error state.
///
/// `SessionManager` is responsible for:
/// - Bootstrapping the session from the auth collaborator
/// - Following identity-change notifications
/// - Loading the profile row for the signed-in user, at most once at a time
/// - Sign-in, sign-out and profile updates with bounded-time remote calls
///
/// Consumers only read [`Session`] snapshots (or watch them via
/// [`SessionManager::subscribe`]); every mutation goes through this type.
///
/// Cloning is cheap and yields a handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    auth: Arc<dyn AuthService>,
    rows: Arc<dyn RowStore>,
    config: SessionConfig,
    state: watch::Sender<Session>,
    profile_flight: SingleFlight<String>,
    /// Bumped on every identity transition; lets bootstrap detect that a
    /// notification or explicit call overtook it
    identity_epoch: AtomicU64,
    /// Bumped whenever `update_profile` stores a profile; fetches issued
    /// before the bump are discarded
    profile_generation: AtomicU64,
    alive: AtomicBool,
    listener: Mutex<Option<Listener>>,
}

struct Listener {
    subscription: SubscriptionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionManager {
    /// Creates a new `SessionManager` in the `Initializing` state.
    ///
    /// # Arguments
    ///
    /// * `auth` - Identity provider used for session checks and sign-in/out
    /// * `rows` - Row store holding the `profiles` table
    /// * `config` - Deadlines for remote calls
    pub fn new(auth: Arc<dyn AuthService>, rows: Arc<dyn RowStore>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(SessionInner {
                auth,
                rows,
                config,
                state,
                profile_flight: SingleFlight::new(),
                identity_epoch: AtomicU64::new(0),
                profile_generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Subscribes to identity changes and resolves the initial session.
    ///
    /// Never fails: errors from the identity check or the profile fetch are
    /// recorded in [`Session::last_error`]. The session is `Ready` when this
    /// returns. Calling it again re-runs the identity check (retry) without
    /// subscribing twice.
    pub async fn initialize(&self) {
        let inner = &self.inner;
        if !inner.is_alive() {
            tracing::debug!(target: "session", "initialize called after shutdown, ignoring");
            return;
        }
        inner.start_listener();

        let epoch = inner.identity_epoch.load(Ordering::SeqCst);
        let result = with_deadline(
            "get_session",
            inner.config.identity_timeout,
            inner.auth.get_session(),
        )
        .await;

        if !inner.is_alive() {
            return;
        }
        if inner.identity_epoch.load(Ordering::SeqCst) != epoch {
            // A notification or explicit call already moved the session on.
            // Its profile fetch (if any) must land before the session is ready.
            tracing::debug!(target: "session", "Bootstrap result superseded, discarding");
            let pending = {
                let session = inner.state.borrow();
                session
                    .user_id()
                    .filter(|_| session.profile.is_none())
                    .map(str::to_string)
            };
            if let Some(user_id) = pending {
                inner.load_profile(user_id).await;
            }
            if inner.is_alive() {
                inner.state.send_modify(Session::mark_ready);
            }
            return;
        }

        match result {
            Ok(Some(identity)) => {
                tracing::info!(target: "session", user_id = %identity.id, "Restored existing session");
                if let Some(user_id) = inner.begin_identity(Some(identity)) {
                    inner.load_profile(user_id).await;
                }
            }
            Ok(None) => {
                tracing::info!(target: "session", "No existing session");
                inner.begin_identity(None);
            }
            Err(err) => {
                tracing::error!(target: "session", error = %err, "Identity check failed");
                inner.identity_epoch.fetch_add(1, Ordering::SeqCst);
                inner.state.send_modify(|session| {
                    session.clear_user();
                    session.last_error = Some(err);
                });
            }
        }
        inner.state.send_modify(Session::mark_ready);
    }

    /// Signs in through the auth collaborator.
    ///
    /// When the backend authenticates immediately, the new identity is applied
    /// and its profile loaded before returning. A redirect outcome leaves the
    /// session untouched; the identity arrives later as a notification.
    ///
    /// # Errors
    ///
    /// Returns the remote or timeout error, which is also stored in
    /// `last_error`. User and profile are left unchanged on failure.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignInOutcome> {
        let inner = &self.inner;
        let result = with_deadline(
            "sign_in",
            inner.config.sign_in_timeout,
            inner.auth.sign_in(&credentials),
        )
        .await;

        match result {
            Ok(SignInOutcome::Authenticated(identity)) => {
                tracing::info!(target: "session", user_id = %identity.id, "Signed in");
                if let Some(user_id) = inner.begin_identity(Some(identity.clone())) {
                    inner.load_profile(user_id).await;
                }
                inner.state.send_modify(Session::mark_ready);
                Ok(SignInOutcome::Authenticated(identity))
            }
            Ok(redirect @ SignInOutcome::Redirect { .. }) => Ok(redirect),
            Err(err) => {
                tracing::warn!(target: "session", error = %err, "Sign-in failed");
                inner.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Clears the local session, then tells the auth collaborator.
    ///
    /// User, profile and error are cleared before the first await, so callers
    /// observe the signed-out state immediately.
    ///
    /// # Errors
    ///
    /// The remote error or timeout is returned for information only. It is not
    /// recorded in `last_error` and the local state stays signed out.
    pub async fn sign_out(&self) -> Result<()> {
        let inner = &self.inner;
        inner.begin_identity(None);
        tracing::info!(target: "session", "Signed out locally");

        let result = with_deadline(
            "sign_out",
            inner.config.sign_out_timeout,
            inner.auth.sign_out(),
        )
        .await;
        if let Err(ref err) = result {
            tracing::warn!(target: "session", error = %err, "Remote sign-out failed, local session already cleared");
        }
        result
    }

    /// Updates fields of the current user's profile.
    ///
    /// # Errors
    ///
    /// - [`FolioError::Precondition`] when nobody is signed in; no remote call
    ///   is made
    /// - Remote or timeout errors from the row store
    ///
    /// Every error is also stored in `last_error`; the profile is left as is.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let inner = &self.inner;
        let result = inner.update_profile(update).await;
        if let Err(ref err) = result {
            tracing::warn!(target: "session", error = %err, "Profile update failed");
            inner.record_error(err.clone());
        }
        result
    }

    /// Re-reads the profile of the current user. No-op when signed out.
    pub async fn refresh_profile(&self) {
        let user_id = self.inner.state.borrow().user_id().map(str::to_string);
        if let Some(user_id) = user_id {
            self.inner.load_profile(user_id).await;
        }
    }

    /// Resets `last_error`.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|session| session.last_error.take().is_some());
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().status()
    }

    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().is_admin()
    }

    /// Stops following identity changes and discards late results.
    ///
    /// The session keeps its last state; nothing is mutated by in-flight
    /// fetches afterwards.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        inner.alive.store(false, Ordering::SeqCst);
        let listener = inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            listener.cancel.cancel();
            inner.auth.unsubscribe(listener.subscription);
            if let Err(err) = listener.task.await {
                tracing::warn!(target: "session", error = %err, "Identity listener ended abnormally");
            }
        }
        tracing::debug!(target: "session", "Session manager shut down");
    }
}

impl SessionInner {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn record_error(&self, err: FolioError) {
        self.state.send_modify(|session| session.last_error = Some(err));
    }

    /// Applies the synchronous part of an identity transition.
    ///
    /// Returns the user id whose profile must be loaded, or `None` when the
    /// session is now signed out (which also marks it ready).
    fn begin_identity(&self, identity: Option<Identity>) -> Option<String> {
        self.identity_epoch.fetch_add(1, Ordering::SeqCst);
        match identity {
            Some(identity) => {
                let user_id = identity.id.clone();
                self.state.send_modify(|session| {
                    session.set_user(identity);
                    session.last_error = None;
                });
                Some(user_id)
            }
            None => {
                self.state.send_modify(|session| {
                    session.clear_user();
                    session.mark_ready();
                });
                None
            }
        }
    }

    fn start_listener(self: &Arc<Self>) {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let subscription = self.auth.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut events = subscription.events;

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    change = events.recv() => {
                        let Some(change) = change else { break };
                        let Some(inner) = weak.upgrade() else { break };
                        if !inner.is_alive() {
                            break;
                        }
                        tracing::debug!(target: "session", kind = %change.kind, "Identity change received");
                        if let Some(user_id) = inner.begin_identity(change.identity) {
                            // The fetch runs on its own task so later
                            // notifications are applied in order without
                            // waiting for it.
                            tokio::spawn(async move {
                                inner.load_profile(user_id).await;
                                if inner.is_alive() {
                                    inner.state.send_modify(Session::mark_ready);
                                }
                            });
                        }
                    }
                }
            }
            tracing::debug!(target: "session", "Identity listener stopped");
        });

        *slot = Some(Listener {
            subscription: subscription.id,
            cancel,
            task,
        });
    }

    /// Loads the profile for `user_id` through the single-flight gate.
    async fn load_profile(self: &Arc<Self>, user_id: String) {
        let inner = Arc::clone(self);
        let key = user_id.clone();
        let role = self
            .profile_flight
            .run(key, move || {
                async move { inner.fetch_profile(user_id).await }.boxed()
            })
            .await;
        if role == FlightRole::Follower {
            tracing::debug!(target: "session", "Joined in-flight profile fetch");
        }
    }

    async fn fetch_profile(&self, user_id: String) {
        let generation = self.profile_generation.load(Ordering::SeqCst);
        let filter = Filter::eq_one("id", user_id.as_str());
        let result = with_deadline(
            "fetch_profile",
            self.config.profile_timeout,
            self.rows.select_one(PROFILES_TABLE, &filter),
        )
        .await
        .and_then(Profile::from_row);

        self.state.send_if_modified(|session| {
            if !self.is_alive()
                || session.user_id() != Some(user_id.as_str())
                || self.profile_generation.load(Ordering::SeqCst) != generation
            {
                tracing::debug!(target: "session", %user_id, "Discarding stale profile result");
                return false;
            }
            match result {
                Ok(profile) => {
                    tracing::debug!(target: "session", %user_id, role = %profile.role, "Profile loaded");
                    session.set_profile(Some(profile));
                }
                Err(err) if err.is_not_found() => {
                    tracing::info!(target: "session", %user_id, "No profile row yet");
                    session.set_profile(None);
                }
                Err(err) => {
                    tracing::error!(target: "session", %user_id, error = %err, "Profile fetch failed");
                    session.set_profile(None);
                    session.last_error = Some(err);
                }
            }
            true
        });
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let user_id = self
            .state
            .borrow()
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| FolioError::precondition("updating a profile requires a signed-in user"))?;

        let fields = update.into_row(chrono::Utc::now())?;
        let filter = Filter::eq_one("id", user_id.as_str());
        let profile = with_deadline(
            "update_profile",
            self.config.profile_timeout,
            self.rows.update(PROFILES_TABLE, &filter, fields),
        )
        .await
        .and_then(Profile::from_row)?;

        self.state.send_if_modified(|session| {
            if session.user_id() != Some(user_id.as_str()) {
                return false;
            }
            self.profile_generation.fetch_add(1, Ordering::SeqCst);
            session.set_profile(Some(profile.clone()));
            true
        });
        tracing::info!(target: "session", %user_id, "Profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
