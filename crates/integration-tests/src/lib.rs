//! Integration tests for the Saleso client.
//!
//! The backend is replaced by a `wiremock` server; each test gets its own
//! server, an in-memory session store and a recording listener.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p saleso-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_refresh` - Token refresh and retry contract
//! - `api_endpoints` - Typed endpoints (login, catalog, checkout, uploads)

use std::sync::Arc;

use saleso_client::store::{ACCESS_TOKEN_KEY, CURRENT_USER_KEY, REFRESH_TOKEN_KEY};
use saleso_client::{ClientConfig, KeyValueStore, MemoryStore, RecordingListener, SalesoClient};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Path prefix of the API on the mock server.
pub const API_PREFIX: &str = "/api";

/// A client wired to a fresh mock backend.
pub struct TestContext {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub listener: Arc<RecordingListener>,
    pub client: SalesoClient,
}

impl TestContext {
    /// Context with an empty session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    /// Context whose store holds the given tokens and a user record.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub async fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let store = MemoryStore::new();
        if let Some(access) = access {
            store.set(ACCESS_TOKEN_KEY, access).unwrap_or_default();
        }
        if let Some(refresh) = refresh {
            store.set(REFRESH_TOKEN_KEY, refresh).unwrap_or_default();
        }
        store
            .set(CURRENT_USER_KEY, &user_json().to_string())
            .unwrap_or_default();
        Self::with_store(store).await
    }

    async fn with_store(store: MemoryStore) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let listener = Arc::new(RecordingListener::new());

        let base = Url::parse(&format!("{}{API_PREFIX}", server.uri()))
            .unwrap_or_else(|e| panic!("mock server URI is not a URL: {e}"));
        let client = SalesoClient::new(&ClientConfig::new(base), store.clone(), listener.clone())
            .unwrap_or_else(|e| panic!("failed to build client: {e}"));

        Self {
            server,
            store,
            listener,
            client,
        }
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).ok().flatten()
    }

    /// Requests the mock server has seen, in arrival order.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests whose path is `API_PREFIX + suffix`.
    pub async fn requests_to(&self, suffix: &str) -> Vec<Request> {
        let full = api(suffix);
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.url.path() == full)
            .collect()
    }

    /// Mount the refresh endpoint answering `refresh_token` with a new pair.
    pub async fn mock_refresh(&self, refresh_token: &str, access: &str, refresh: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(api("/auth/refresh/token")))
            .and(header("refreshToken", refresh_token))
            .respond_with(refreshed(access, refresh))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}

/// Full mock-server path for an API path.
#[must_use]
pub fn api(suffix: &str) -> String {
    format!("{API_PREFIX}{suffix}")
}

/// Value of the access-token header on a recorded request.
#[must_use]
pub fn access_token_of(request: &Request) -> Option<String> {
    request
        .headers
        .get("accessToken")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Successful refresh response.
#[must_use]
pub fn refreshed(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "newAccessToken": access,
        "newRefreshToken": refresh,
    }))
}

/// Stored user record used by [`TestContext::with_tokens`].
#[must_use]
pub fn user_json() -> Value {
    json!({"_id": "u1", "username": "ana", "role": "seller", "email": "ana@example.com"})
}

/// Body of `GET /user/user-detail` for the test user.
#[must_use]
pub fn user_detail_json() -> Value {
    json!({
        "_id": "u1",
        "username": "ana",
        "email": "ana@example.com",
        "role": "seller",
        "firstName": "Ana",
    })
}
