//! Session snapshot model.

use crate::error::FolioError;
use crate::identity::Identity;
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Whether the initial identity check has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Initializing,
    Ready,
}

/// Coarse state derived from a [`Session`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    /// User resolved, profile not loaded yet
    ProfilePending,
    Authenticated,
    Unauthenticated,
    Errored,
}

/// Read-only snapshot of the current session.
///
/// `profile` is only ever `Some` while `current_user` is `Some`; the setters
/// below keep that invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub current_user: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: LoadingState,
    pub last_error: Option<FolioError>,
    /// Set once a profile fetch for `current_user` has settled (found or not)
    #[serde(default)]
    pub profile_resolved: bool,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }

    pub fn is_ready(&self) -> bool {
        self.loading == LoadingState::Ready
    }

    pub fn user_id(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.id.as_str())
    }

    pub fn status(&self) -> SessionStatus {
        if self.last_error.is_some() {
            return SessionStatus::Errored;
        }
        match (&self.current_user, self.profile_resolved) {
            (None, _) if self.loading == LoadingState::Initializing => SessionStatus::Initializing,
            (None, _) => SessionStatus::Unauthenticated,
            (Some(_), false) => SessionStatus::ProfilePending,
            (Some(_), true) => SessionStatus::Authenticated,
        }
    }

    /// Switches to `identity`. Drops the profile when the user changes.
    pub fn set_user(&mut self, identity: Identity) {
        let same_user = self.user_id() == Some(identity.id.as_str());
        if !same_user {
            self.profile = None;
            self.profile_resolved = false;
        }
        self.current_user = Some(identity);
    }

    /// Applies a profile fetch result. Ignored when nobody is signed in.
    pub fn set_profile(&mut self, profile: Option<Profile>) {
        if self.current_user.is_none() {
            return;
        }
        self.profile = profile;
        self.profile_resolved = true;
    }

    /// Clears user, profile and error.
    pub fn clear_user(&mut self) {
        self.current_user = None;
        self.profile = None;
        self.profile_resolved = false;
        self.last_error = None;
    }

    pub fn mark_ready(&mut self) {
        self.loading = LoadingState::Ready;
    }
}
