//! Session-expired notices.
//!
//! When a refresh fails the session is over. The session manager clears the
//! stored credentials and hands a [`SessionExpired`] notice to the
//! configured [`SessionListener`], which is responsible for telling the user
//! and sending them to the login entry point.

use std::sync::Mutex;

use crate::error::RefreshFailure;

/// Notice emitted once per failed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    /// Why the refresh failed.
    pub reason: RefreshFailure,
    /// Where the user should sign in again.
    pub login_url: String,
}

impl SessionExpired {
    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Your session has expired. Please log in again at {}",
            self.login_url
        )
    }
}

/// Receives session-expired notices.
pub trait SessionListener: Send + Sync {
    /// Called after the stored session has been cleared.
    fn session_expired(&self, notice: &SessionExpired);
}

/// Default listener: reports the notice through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl SessionListener for LogListener {
    fn session_expired(&self, notice: &SessionExpired) {
        tracing::warn!(
            reason = %notice.reason,
            login_url = %notice.login_url,
            "{}",
            notice.message()
        );
    }
}

/// Listener that keeps every notice it receives.
///
/// Useful for embedding the client in a front end that polls for
/// navigation, and in tests.
#[derive(Debug, Default)]
pub struct RecordingListener {
    notices: Mutex<Vec<SessionExpired>>,
}

impl RecordingListener {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<SessionExpired> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Remove and return the received notices.
    pub fn take(&self) -> Vec<SessionExpired> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl SessionListener for RecordingListener {
    fn session_expired(&self, notice: &SessionExpired) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
