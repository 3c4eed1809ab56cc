//! Session manager: credentials, current user, and credential refresh.
//!
//! All session state lives in an injected [`KeyValueStore`]; nothing else in
//! the crate reads or writes the credential keys directly.
//!
//! # Refresh
//!
//! [`SessionManager::refresh`] exchanges the stored refresh token for a new
//! token pair at `GET {base}/auth/refresh/token`. Concurrent callers share
//! one in-flight refresh: the first caller starts it, later callers await
//! the same result. A caller whose rejected token was already replaced in
//! storage gets the stored token back without another round trip.
//!
//! When a refresh fails for any reason the session is cleared and the
//! [`SessionListener`] receives a [`SessionExpired`] notice.

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use saleso_core::{CurrentUser, RefreshedTokens, ThemeMode, TokenPair};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{GatewayError, RefreshFailure};
use crate::gateway::{REFRESH_PATH, REFRESH_TOKEN_HEADER, join_path};
use crate::notice::{SessionExpired, SessionListener};
use crate::store::{
    ACCESS_TOKEN_KEY, CURRENT_USER_KEY, KeyValueStore, REFRESH_TOKEN_KEY, StoreError,
    THEME_MODE_KEY,
};

type RefreshResult = Result<SecretString, RefreshFailure>;
type InFlightRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Owner of the client-side session.
///
/// Cheap to clone; clones share storage and the in-flight refresh slot.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn KeyValueStore>,
    http: reqwest::Client,
    refresh_url: Url,
    login_url: String,
    listener: Arc<dyn SessionListener>,
    in_flight: Mutex<Option<InFlightRefresh>>,
}

impl SessionManager {
    /// Create a session manager over `store`.
    ///
    /// `http` is used only for the refresh call.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh URL cannot be built from the
    /// configured base URL.
    pub fn new(
        config: &ClientConfig,
        http: reqwest::Client,
        store: Arc<dyn KeyValueStore>,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                http,
                refresh_url: join_path(&config.api_base_url, REFRESH_PATH)?,
                login_url: config.login_url.clone(),
                listener,
                in_flight: Mutex::new(None),
            }),
        })
    }

    /// Where users are sent when the session expires.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.inner.login_url
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, StoreError> {
        read_secret(self.inner.store.as_ref(), ACCESS_TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        read_secret(self.inner.store.as_ref(), REFRESH_TOKEN_KEY)
    }

    /// Both tokens, when both are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn credentials(&self) -> Result<Option<TokenPair>, StoreError> {
        let access = self.access_token()?;
        let refresh = self.refresh_token()?;
        Ok(access.zip(refresh).map(|(a, r)| {
            TokenPair::new(a.expose_secret(), r.expose_secret())
        }))
    }

    /// Replace both stored tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn store_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        write_tokens(self.inner.store.as_ref(), tokens)
    }

    /// Persist a fresh login: both tokens and the user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn store_login(&self, tokens: &TokenPair, user: &CurrentUser) -> Result<(), StoreError> {
        let json = serde_json::to_string(user)?;
        self.inner.store.set_many(&[
            (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
            (CURRENT_USER_KEY, json.as_str()),
        ])
    }

    /// The stored user record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds invalid JSON.
    pub fn current_user(&self) -> Result<Option<CurrentUser>, StoreError> {
        self.inner
            .store
            .get(CURRENT_USER_KEY)?
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    /// Replace the stored user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_current_user(&self, user: &CurrentUser) -> Result<(), StoreError> {
        let json = serde_json::to_string(user)?;
        self.inner.store.set(CURRENT_USER_KEY, &json)
    }

    /// Whether a session exists that could still be used or renewed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn is_logged_in(&self) -> Result<bool, StoreError> {
        Ok(self.refresh_token()?.is_some() || self.access_token()?.is_some())
    }

    /// Remove credentials and the user record. The theme preference stays.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        clear_session(self.inner.store.as_ref())
    }

    /// The stored theme preference; unknown values read as the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn theme_mode(&self) -> Result<ThemeMode, StoreError> {
        Ok(self
            .inner
            .store
            .get(THEME_MODE_KEY)?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default())
    }

    /// Persist the theme preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<(), StoreError> {
        self.inner.store.set(THEME_MODE_KEY, mode.as_str())
    }

    /// Expire the session up front when no refresh token is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshFailure::MissingRefreshToken`] (after clearing the
    /// session and notifying the listener) or a storage failure.
    pub fn ensure_renewable(&self) -> Result<(), RefreshFailure> {
        if self.refresh_token().map_err(store_failure)?.is_some() {
            return Ok(());
        }
        let reason = RefreshFailure::MissingRefreshToken;
        self.inner.expire(reason.clone());
        Err(reason)
    }

    /// Obtain a new access token.
    ///
    /// `rejected` is the token the caller just saw fail, or `None` when the
    /// caller had no token at all. If storage already holds a different
    /// token, it is returned without a network call.
    ///
    /// # Errors
    ///
    /// Returns the [`RefreshFailure`] when no new token could be obtained.
    /// The session has been cleared and the listener notified by then.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        rejected: Option<&SecretString>,
    ) -> Result<SecretString, RefreshFailure> {
        let pending = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .map_err(|_| RefreshFailure::Store("refresh slot poisoned".to_string()))?;

            if let Some(pending) = slot.as_ref() {
                debug!("Joining in-flight credential refresh");
                pending.clone()
            } else {
                let current = self.access_token().map_err(store_failure)?;
                if let Some(current) = current
                    && rejected.is_none_or(|r| r.expose_secret() != current.expose_secret())
                {
                    debug!("Access token already renewed; skipping refresh");
                    return Ok(current);
                }

                let inner = Arc::clone(&self.inner);
                let pending = async move { inner.run_refresh().await }.boxed().shared();
                *slot = Some(pending.clone());
                pending
            }
        };

        pending.await
    }
}

impl SessionInner {
    async fn run_refresh(&self) -> RefreshResult {
        let result = self.exchange_refresh_token().await;

        match &result {
            Ok(_) => info!("Session credentials refreshed"),
            Err(reason) => self.expire(reason.clone()),
        }

        // Storage is settled before the slot opens, so later callers see the
        // new token (or the cleared session) rather than starting over.
        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = None;
        }

        result
    }

    async fn exchange_refresh_token(&self) -> RefreshResult {
        let refresh_token = read_secret(self.store.as_ref(), REFRESH_TOKEN_KEY)
            .map_err(store_failure)?
            .ok_or(RefreshFailure::MissingRefreshToken)?;

        debug!(url = %self.refresh_url, "Requesting new credentials");
        let response = self
            .http
            .get(self.refresh_url.clone())
            .header(REFRESH_TOKEN_HEADER, refresh_token.expose_secret())
            .send()
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;
        let refreshed: RefreshedTokens =
            serde_json::from_str(&body).map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

        let tokens = TokenPair::from(refreshed);
        if tokens.access_token.is_empty() || tokens.refresh_token.is_empty() {
            return Err(RefreshFailure::Malformed("empty token".to_string()));
        }

        write_tokens(self.store.as_ref(), &tokens).map_err(store_failure)?;
        Ok(SecretString::from(tokens.access_token))
    }

    fn expire(&self, reason: RefreshFailure) {
        warn!(%reason, "Credential refresh failed; clearing session");
        if let Err(e) = clear_session(self.store.as_ref()) {
            error!(error = %e, "Failed to clear session storage");
        }
        self.listener.session_expired(&SessionExpired {
            reason,
            login_url: self.login_url.clone(),
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_url", &self.inner.refresh_url.as_str())
            .field("login_url", &self.inner.login_url)
            .finish_non_exhaustive()
    }
}

fn read_secret(store: &dyn KeyValueStore, key: &str) -> Result<Option<SecretString>, StoreError> {
    Ok(store
        .get(key)?
        .filter(|v| !v.is_empty())
        .map(SecretString::from))
}

fn write_tokens(store: &dyn KeyValueStore, tokens: &TokenPair) -> Result<(), StoreError> {
    store.set_many(&[
        (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
        (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
    ])
}

fn clear_session(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CURRENT_USER_KEY])
}

fn store_failure(e: StoreError) -> RefreshFailure {
    RefreshFailure::Store(e.to_string())
}
