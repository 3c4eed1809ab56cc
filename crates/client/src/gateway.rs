//! Authenticated request gateway.
//!
//! Every backend call goes through [`Gateway`]. It attaches the stored
//! access token as the `accessToken` header and recovers from a rejected
//! token exactly once:
//!
//! 1. No refresh token stored: the session is expired, nothing is sent.
//! 2. No access token stored: refresh first, then send.
//! 3. Send. On `401`, if this call has not refreshed yet, refresh and send
//!    once more with the new token.
//! 4. A `401` after a refresh is final ([`GatewayError::Unauthorized`]).
//!
//! So a call makes at most one refresh and at most one retry. Other
//! failures are never retried.

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{GatewayError, error_message};
use crate::notice::SessionListener;
use crate::session::SessionManager;
use crate::store::KeyValueStore;

/// Header carrying the access token on API calls.
pub const ACCESS_TOKEN_HEADER: &str = "accessToken";
/// Header carrying the refresh token on the refresh call.
pub const REFRESH_TOKEN_HEADER: &str = "refreshToken";
/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/refresh/token";

/// HTTP gateway with transparent credential refresh.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionManager,
}

impl Gateway {
    /// Create a gateway for `config.api_base_url` over the given session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the base URL
    /// cannot be combined with the refresh path.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        let session = SessionManager::new(config, http.clone(), store, listener)?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                http,
                base_url: config.api_base_url.clone(),
                session,
            }),
        })
    }

    /// The session this gateway authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Absolute URL for a request path.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPath`] for absolute URLs or paths that
    /// do not form a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        join_path(&self.inner.base_url, path)
    }

    /// Send an authenticated request with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See the module documentation for the refresh policy. Non-success
    /// responses map to [`GatewayError::NotFound`] or [`GatewayError::Api`].
    #[instrument(skip(self, body), fields(%method))]
    pub async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.execute(method, path, |request| {
            Ok(match body {
                Some(body) => request.json(body),
                None => request,
            })
        })
        .await
    }

    /// `GET` a path.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// `DELETE` a path.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send::<T, ()>(Method::DELETE, path, None).await
    }

    /// `POST` a multipart form.
    ///
    /// `build_form` is called once per attempt because a form cannot be
    /// sent twice.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; errors from `build_form` are returned as is.
    #[instrument(skip(self, build_form))]
    pub async fn send_multipart<T, F>(&self, path: &str, build_form: F) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<Form, GatewayError> + Sync,
    {
        self.execute(Method::POST, path, |request| {
            Ok(request.multipart(build_form()?))
        })
        .await
    }

    /// Send a request without credentials (login and other public endpoints).
    ///
    /// # Errors
    ///
    /// Non-success responses map to [`GatewayError::NotFound`] or
    /// [`GatewayError::Api`]; there is no refresh.
    #[instrument(skip(self, body), fields(%method))]
    pub async fn send_public<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(path)?;
        let mut request = self.inner.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        decode_response(request.send().await?).await
    }

    async fn execute<T, F>(&self, method: Method, path: &str, attach: F) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> Result<RequestBuilder, GatewayError> + Sync,
    {
        let url = self.endpoint(path)?;
        let session = self.session();

        session.ensure_renewable()?;

        let mut refreshed = false;
        let token = if let Some(token) = session.access_token()? {
            token
        } else {
            debug!("No access token stored; refreshing before first attempt");
            refreshed = true;
            session.refresh(None).await?
        };

        let response = self.dispatch(&method, &url, &token, &attach).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode_response(response).await;
        }

        if refreshed {
            warn!("Freshly issued access token was rejected");
            return Err(GatewayError::Unauthorized);
        }

        debug!("Access token rejected; refreshing and retrying once");
        let token = session.refresh(Some(&token)).await?;
        let response = self.dispatch(&method, &url, &token, &attach).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Access token rejected after refresh");
            return Err(GatewayError::Unauthorized);
        }

        decode_response(response).await
    }

    async fn dispatch<F>(
        &self,
        method: &Method,
        url: &Url,
        token: &SecretString,
        attach: &F,
    ) -> Result<Response, GatewayError>
    where
        F: Fn(RequestBuilder) -> Result<RequestBuilder, GatewayError>,
    {
        let request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(ACCESS_TOKEN_HEADER, token.expose_secret());
        Ok(attach(request)?.send().await?)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Append a relative request path to the base URL.
///
/// The base URL's own path is kept (`https://host/api` + `/user` is
/// `https://host/api/user`), unlike `Url::join`.
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, GatewayError> {
    if path.contains("://") || path.starts_with("//") {
        return Err(GatewayError::InvalidPath(path.to_string()));
    }

    let base = base.as_str().trim_end_matches('/');
    let relative = path.trim_start_matches('/');
    Url::parse(&format!("{base}/{relative}"))
        .map_err(|_| GatewayError::InvalidPath(path.to_string()))
}

/// Turn a response into `T` or a typed error.
///
/// An empty success body decodes as JSON `null`.
async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let path = response.url().path().to_string();
    let body = response.text().await?;

    if status.is_success() {
        let text = if body.trim().is_empty() { "null" } else { &body };
        return serde_json::from_str(text).map_err(|e| {
            error!(
                error = %e,
                %path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            GatewayError::Parse(format!("Failed to parse response: {e}"))
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(path));
    }

    let message = error_message(&body);
    if status.is_server_error() {
        error!(%status, %path, body = %body.chars().take(500).collect::<String>(), "Backend error");
    } else {
        warn!(%status, %path, %message, "Request rejected by backend");
    }

    Err(GatewayError::Api {
        status: status.as_u16(),
        message,
    })
}
