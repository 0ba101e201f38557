use std::time::Duration;

/// Deadlines applied by [`super::SessionManager`] to remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// `AuthService::get_session` during bootstrap
    pub identity_timeout: Duration,
    /// Profile select and update
    pub profile_timeout: Duration,
    pub sign_in_timeout: Duration,
    /// Kept short: local state is already cleared when this runs
    pub sign_out_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            identity_timeout: Duration::from_secs(10),
            profile_timeout: Duration::from_secs(10),
            sign_in_timeout: Duration::from_secs(10),
            sign_out_timeout: Duration::from_secs(3),
        }
    }
}
