use super::SessionManager;
use crate::session::SessionConfig;
use async_trait::async_trait;
use folio_core::identity::{
    AuthChange, AuthProvider, AuthService, AuthSubscription, Credentials, Identity, SignInOutcome,
    SubscriptionId,
};
use folio_core::profile::{ProfileUpdate, Role};
use folio_core::session::{LoadingState, Session, SessionStatus};
use folio_core::store::{Filter, Query, Row, RowStore};
use folio_core::{FolioError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Mock AuthService
// ============================================================================

#[derive(Clone)]
enum Reply<T> {
    Ok(T),
    Fail(FolioError),
    Hang,
}

struct MockAuth {
    session: Mutex<Reply<Option<Identity>>>,
    session_delay: Mutex<Duration>,
    sign_in: Mutex<Reply<SignInOutcome>>,
    sign_out: Mutex<Reply<()>>,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<AuthChange>>>,
    next_id: AtomicU64,
    sign_out_calls: AtomicUsize,
}

impl MockAuth {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(Reply::Ok(None)),
            session_delay: Mutex::new(Duration::ZERO),
            sign_in: Mutex::new(Reply::Fail(FolioError::remote("sign_in", "not configured"))),
            sign_out: Mutex::new(Reply::Ok(())),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            sign_out_calls: AtomicUsize::new(0),
        })
    }

    fn with_session(self: Arc<Self>, reply: Reply<Option<Identity>>) -> Arc<Self> {
        *self.session.lock().unwrap() = reply;
        self
    }

    fn emit(&self, identity: Option<Identity>) {
        let change = match identity {
            Some(identity) => AuthChange::signed_in(identity),
            None => AuthChange::signed_out(),
        };
        for sender in self.subscribers.lock().unwrap().values() {
            let _ = sender.send(change.clone());
        }
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

async fn resolve<T: Clone>(reply: Reply<T>, operation: &str) -> Result<T> {
    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Fail(err) => Err(err),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(FolioError::remote(operation, "hung call returned"))
        }
    }
}

#[async_trait]
impl AuthService for MockAuth {
    async fn get_session(&self) -> Result<Option<Identity>> {
        let delay = *self.session_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let reply = self.session.lock().unwrap().clone();
        resolve(reply, "get_session").await
    }

    fn subscribe(&self) -> AuthSubscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().insert(id, tx);
        AuthSubscription {
            id: SubscriptionId(id),
            events: rx,
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&id.0);
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<SignInOutcome> {
        let reply = self.sign_in.lock().unwrap().clone();
        resolve(reply, "sign_in").await
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.sign_out.lock().unwrap().clone();
        resolve(reply, "sign_out").await
    }
}

// ============================================================================
// Mock RowStore (profiles only)
// ============================================================================

struct MockRows {
    profiles: Mutex<HashMap<String, Row>>,
    select_delay: Mutex<Duration>,
    select_error: Mutex<Option<FolioError>>,
    update_error: Mutex<Option<FolioError>>,
    select_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MockRows {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            profiles: Mutex::new(HashMap::new()),
            select_delay: Mutex::new(Duration::ZERO),
            select_error: Mutex::new(None),
            update_error: Mutex::new(None),
            select_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        })
    }

    fn with_profile(self: Arc<Self>, id: &str, name: &str, role: Role) -> Arc<Self> {
        let row = json!({ "id": id, "full_name": name, "role": role.to_string() });
        self.profiles
            .lock()
            .unwrap()
            .insert(id.to_string(), row.as_object().cloned().unwrap());
        self
    }

    fn with_select_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.select_delay.lock().unwrap() = delay;
        self
    }

    fn selects(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }
}

fn id_of(filter: &Filter) -> String {
    filter
        .conditions()
        .iter()
        .find(|(column, _)| column == "id")
        .and_then(|(_, value)| value.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl RowStore for MockRows {
    async fn select(&self, _table: &str, _query: &Query) -> Result<Vec<Row>> {
        Ok(self.profiles.lock().unwrap().values().cloned().collect())
    }

    // The row is read when the request is issued; the reply arrives after
    // `select_delay`.
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Row> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        let id = id_of(filter);
        let row = self.profiles.lock().unwrap().get(&id).cloned();
        let delay = *self.select_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.select_error.lock().unwrap().clone() {
            return Err(err);
        }
        row.ok_or_else(|| FolioError::not_found(table, id))
    }

    async fn insert(&self, _table: &str, row: Row) -> Result<Row> {
        Ok(row)
    }

    async fn update(&self, table: &str, filter: &Filter, fields: Row) -> Result<Row> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.update_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = id_of(filter);
        let mut profiles = self.profiles.lock().unwrap();
        let row = profiles
            .get_mut(&id)
            .ok_or_else(|| FolioError::not_found(table, id.clone()))?;
        row.extend(fields);
        Ok(row.clone())
    }

    async fn delete(&self, _table: &str, _filter: &Filter) -> Result<u64> {
        Ok(0)
    }

    async fn increment(&self, table: &str, filter: &Filter, _column: &str, _by: i64) -> Result<Row> {
        Err(FolioError::not_found(table, id_of(filter)))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn user(id: &str) -> Identity {
    Identity::new(id, Some(format!("{}@example.com", id)))
}

fn manager(auth: &Arc<MockAuth>, rows: &Arc<MockRows>) -> SessionManager {
    SessionManager::new(auth.clone(), rows.clone(), SessionConfig::default())
}

async fn wait_until(manager: &SessionManager, predicate: impl Fn(&Session) -> bool) -> Session {
    let mut rx = manager.subscribe();
    let session = tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| predicate(s)))
        .await
        .expect("session never reached expected state")
        .expect("session sender dropped")
        .clone();
    session
}

/// Drives the runtime until no task can make progress without time advancing.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bootstrap_without_session_is_unauthenticated() {
    let auth = MockAuth::new();
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);
    assert_eq!(manager.status(), SessionStatus::Initializing);

    manager.initialize().await;

    let session = manager.snapshot();
    assert_eq!(session.loading, LoadingState::Ready);
    assert!(session.current_user.is_none());
    assert!(session.last_error.is_none());
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
    assert_eq!(rows.selects(), 0);
    assert_eq!(auth.subscriber_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_loads_existing_profile() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Admin);
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert_eq!(session.user_id(), Some("u1"));
    assert_eq!(session.profile.as_ref().unwrap().full_name.as_deref(), Some("Ada"));
    assert!(manager.is_admin());
    assert_eq!(manager.status(), SessionStatus::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_missing_profile_is_not_an_error() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert_eq!(session.current_user, Some(user("u1")));
    assert!(session.profile.is_none());
    assert!(session.last_error.is_none());
    assert_eq!(session.loading, LoadingState::Ready);
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_identity_timeout_records_error() {
    let auth = MockAuth::new().with_session(Reply::Hang);
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert!(session.current_user.is_none());
    assert!(session.last_error.as_ref().unwrap().is_timeout());
    assert_eq!(session.loading, LoadingState::Ready);
    assert_eq!(session.status(), SessionStatus::Errored);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_identity_failure_records_remote_error() {
    let auth =
        MockAuth::new().with_session(Reply::Fail(FolioError::remote("get_session", "503")));
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert!(session.last_error.as_ref().unwrap().is_remote());
    assert!(session.is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_profile_fetch_failure_errors_without_profile() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    *rows.select_error.lock().unwrap() = Some(FolioError::remote("select profiles", "reset"));
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert_eq!(session.user_id(), Some("u1"));
    assert!(session.profile.is_none());
    assert_eq!(session.status(), SessionStatus::Errored);
}

#[tokio::test(start_paused = true)]
async fn test_profile_fetch_timeout_errors() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Member)
        .with_select_delay(Duration::from_secs(30));
    let manager = manager(&auth, &rows);

    manager.initialize().await;

    let session = manager.snapshot();
    assert!(session.profile.is_none());
    assert!(session.last_error.unwrap().is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_error_recovers() {
    let auth = MockAuth::new().with_session(Reply::Hang);
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    assert_eq!(manager.status(), SessionStatus::Errored);

    *auth.session.lock().unwrap() = Reply::Ok(Some(user("u1")));
    manager.initialize().await;

    assert_eq!(manager.status(), SessionStatus::Authenticated);
    assert_eq!(auth.subscriber_count(), 1);
}

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bootstrap_and_notification_issue_one_read() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Member)
        .with_select_delay(Duration::from_secs(1));
    let manager = manager(&auth, &rows);

    let bootstrap = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.initialize().await })
    };
    settle().await;
    assert_eq!(rows.selects(), 1);

    // Same user reported while the bootstrap fetch is outstanding.
    auth.emit(Some(user("u1")));
    settle().await;

    bootstrap.await.unwrap();
    let session = wait_until(&manager, |s| s.profile.is_some()).await;
    assert_eq!(session.profile.unwrap().id, "u1");
    assert_eq!(rows.selects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_notification_during_identity_check_waits_for_profile() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    *auth.session_delay.lock().unwrap() = Duration::from_secs(1);
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Admin)
        .with_select_delay(Duration::from_secs(5));
    let manager = manager(&auth, &rows);

    let bootstrap = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.initialize().await })
    };
    settle().await;

    // Reported before the identity check resolves.
    auth.emit(Some(user("u1")));
    settle().await;
    assert_eq!(rows.selects(), 1);
    assert_eq!(manager.snapshot().loading, LoadingState::Initializing);

    bootstrap.await.unwrap();
    let session = manager.snapshot();
    assert_eq!(session.loading, LoadingState::Ready);
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.profile.map(|p| p.id), Some("u1".to_string()));
    assert!(manager.is_admin());
    assert_eq!(rows.selects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_during_identity_check_is_ready_without_fetch() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    *auth.session_delay.lock().unwrap() = Duration::from_secs(1);
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);

    let bootstrap = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.initialize().await })
    };
    settle().await;
    auth.emit(None);
    settle().await;

    bootstrap.await.unwrap();
    let session = manager.snapshot();
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(session.current_user.is_none());
    assert_eq!(rows.selects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_then_same_user_notification_fetches_once() {
    let auth = MockAuth::new();
    *auth.sign_in.lock().unwrap() = Reply::Ok(SignInOutcome::Authenticated(user("u1")));
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Admin)
        .with_select_delay(Duration::from_secs(1));
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let sign_in = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .sign_in(Credentials::Password {
                    email: "u1@example.com".into(),
                    password: "secret".into(),
                })
                .await
        })
    };
    settle().await;
    auth.emit(Some(user("u1")));
    settle().await;

    let outcome = sign_in.await.unwrap().unwrap();
    assert_eq!(outcome, SignInOutcome::Authenticated(user("u1")));
    assert!(manager.is_admin());
    assert_eq!(rows.selects(), 1);
}

// ============================================================================
// Staleness
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fetch_resolving_after_sign_out_is_discarded() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Admin)
        .with_select_delay(Duration::from_secs(5));
    let manager = manager(&auth, &rows);

    let bootstrap = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.initialize().await })
    };
    settle().await;
    assert_eq!(rows.selects(), 1);

    manager.sign_out().await.unwrap();
    bootstrap.await.unwrap();

    let session = manager.snapshot();
    assert!(session.current_user.is_none());
    assert!(session.profile.is_none());
    assert!(!manager.is_admin());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_for_previous_user_is_discarded() {
    let auth = MockAuth::new();
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Admin)
        .with_profile("u2", "Grace", Role::Member)
        .with_select_delay(Duration::from_secs(2));
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    auth.emit(Some(user("u1")));
    settle().await;
    auth.emit(Some(user("u2")));

    let session = wait_until(&manager, |s| s.profile.is_some()).await;
    assert_eq!(session.profile.unwrap().id, "u2");

    // Let the u1 flight finish; it must not overwrite u2's profile.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let session = manager.snapshot();
    assert_eq!(session.user_id(), Some("u2"));
    assert_eq!(session.profile.unwrap().full_name.as_deref(), Some("Grace"));
    assert!(!manager.is_admin());
    assert_eq!(rows.selects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_profile_never_outlives_user() {
    let auth = MockAuth::new();
    let rows = MockRows::new()
        .with_profile("u1", "Ada", Role::Admin)
        .with_profile("u2", "Grace", Role::Member)
        .with_select_delay(Duration::from_millis(300));
    let manager = manager(&auth, &rows);

    let violations = Arc::new(AtomicUsize::new(0));
    let observed = Arc::new(AtomicUsize::new(0));
    let watcher = {
        let mut rx = manager.subscribe();
        let violations = violations.clone();
        let observed = observed.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                observed.fetch_add(1, Ordering::SeqCst);
                if session.profile.is_some() && session.current_user.is_none() {
                    violations.fetch_add(1, Ordering::SeqCst);
                }
            }
        })
    };

    manager.initialize().await;
    let sequence = [Some("u1"), None, Some("u2"), Some("u1"), None, Some("u2")];
    for step in sequence {
        auth.emit(step.map(user));
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    manager.shutdown().await;
    drop(manager);
    watcher.await.unwrap();

    assert!(observed.load(Ordering::SeqCst) > 0);
    assert_eq!(violations.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sign_out_clears_before_remote_resolves() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    *auth.sign_out.lock().unwrap() = Reply::Hang;
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Admin);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    assert!(manager.is_admin());

    let sign_out = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.sign_out().await })
    };
    settle().await;

    assert_eq!(auth.sign_out_calls.load(Ordering::SeqCst), 1);
    let session = manager.snapshot();
    assert!(session.current_user.is_none());
    assert!(session.profile.is_none());

    let result = sign_out.await.unwrap();
    assert!(result.unwrap_err().is_timeout());
    let session = manager.snapshot();
    assert!(session.current_user.is_none());
    assert!(session.last_error.is_none());
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_remote_failure_keeps_local_state_cleared() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    *auth.sign_out.lock().unwrap() = Reply::Fail(FolioError::remote("sign_out", "offline"));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let result = manager.sign_out().await;

    assert!(result.unwrap_err().is_remote());
    let session = manager.snapshot();
    assert!(session.current_user.is_none());
    assert!(session.last_error.is_none());
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sign_in_failure_records_error_and_keeps_state() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    *auth.sign_in.lock().unwrap() =
        Reply::Fail(FolioError::remote("sign_in", "invalid login credentials"));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let err = manager
        .sign_in(Credentials::Password {
            email: "u2@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert!(err.is_remote());
    let session = manager.snapshot();
    assert_eq!(session.user_id(), Some("u1"));
    assert!(session.profile.is_some());
    assert_eq!(session.last_error, Some(err));

    manager.clear_error();
    assert!(manager.snapshot().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_oauth_redirect_leaves_session_untouched() {
    let auth = MockAuth::new();
    *auth.sign_in.lock().unwrap() = Reply::Ok(SignInOutcome::Redirect {
        url: "https://auth.example.com/authorize?provider=github".into(),
    });
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let outcome = manager
        .sign_in(Credentials::OAuth {
            provider: AuthProvider::Github,
            redirect_to: None,
        })
        .await
        .unwrap();

    assert!(matches!(outcome, SignInOutcome::Redirect { .. }));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
    assert_eq!(rows.selects(), 0);
}

// ============================================================================
// Profile updates
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_update_profile_without_user_is_precondition() {
    let auth = MockAuth::new();
    let rows = MockRows::new();
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let err = manager
        .update_profile(ProfileUpdate::full_name("Nobody"))
        .await
        .unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(rows.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(manager.snapshot().last_error, Some(err));
}

#[tokio::test(start_paused = true)]
async fn test_update_profile_replaces_profile() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    let profile = manager
        .update_profile(ProfileUpdate::full_name("Ada Lovelace"))
        .await
        .unwrap();

    assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
    assert!(profile.updated_at.is_some());
    assert_eq!(manager.snapshot().profile, Some(profile));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_issued_before_update_does_not_overwrite_it() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    *rows.select_delay.lock().unwrap() = Duration::from_secs(5);

    let refresh = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.refresh_profile().await })
    };
    settle().await;
    assert_eq!(rows.selects(), 2);

    let updated = manager
        .update_profile(ProfileUpdate::full_name("Ada Lovelace"))
        .await
        .unwrap();
    refresh.await.unwrap();

    assert_eq!(manager.snapshot().profile, Some(updated));
    assert!(manager.snapshot().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_update_profile_failure_keeps_profile() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    *rows.update_error.lock().unwrap() = Some(FolioError::remote("update profiles", "denied"));

    let err = manager
        .update_profile(ProfileUpdate::full_name("Ada Lovelace"))
        .await
        .unwrap_err();

    let session = manager.snapshot();
    assert_eq!(session.profile.unwrap().full_name.as_deref(), Some("Ada"));
    assert_eq!(session.last_error, Some(err));
}

// ============================================================================
// Notifications and teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_signed_out_notification_clears_without_fetch() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    assert_eq!(rows.selects(), 1);

    auth.emit(None);
    let session = wait_until(&manager, |s| s.current_user.is_none()).await;

    assert!(session.profile.is_none());
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert_eq!(rows.selects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_profile_rereads_row() {
    let auth = MockAuth::new().with_session(Reply::Ok(Some(user("u1"))));
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;

    rows.profiles.lock().unwrap().get_mut("u1").unwrap()["role"] = json!("admin");
    manager.refresh_profile().await;

    assert!(manager.is_admin());
    assert_eq!(rows.selects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_unsubscribes_and_ignores_late_events() {
    let auth = MockAuth::new();
    let rows = MockRows::new().with_profile("u1", "Ada", Role::Member);
    let manager = manager(&auth, &rows);
    manager.initialize().await;
    assert_eq!(auth.subscriber_count(), 1);

    manager.shutdown().await;
    assert_eq!(auth.subscriber_count(), 0);

    auth.emit(Some(user("u1")));
    settle().await;
    assert!(manager.snapshot().current_user.is_none());
    assert_eq!(rows.selects(), 0);
}
