//! Token refresh and retry behavior of the authenticated gateway.
//!
//! Every test runs against its own mock backend; mock expectations are
//! verified when the server drops at the end of the test.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use saleso_client::store::{ACCESS_TOKEN_KEY, CURRENT_USER_KEY, REFRESH_TOKEN_KEY, THEME_MODE_KEY};
use saleso_client::{
    ClientConfig, GatewayError, KeyValueStore, MemoryStore, RecordingListener, RefreshFailure,
    SalesoClient,
};
use saleso_core::UserDetail;
use saleso_integration_tests::{
    TestContext, access_token_of, api, refreshed, user_detail_json,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mock_user_detail(ctx: &TestContext, token: &str, status: u16, times: u64) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(user_detail_json())
    } else {
        ResponseTemplate::new(status).set_body_json(json!({"message": "jwt expired"}))
    };

    Mock::given(method("GET"))
        .and(path(api("/user/user-detail")))
        .and(header("accessToken", token))
        .respond_with(response)
        .expect(times)
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_valid_token_makes_single_call() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    mock_user_detail(&ctx, "A1", 200, 1).await;
    ctx.mock_refresh("R1", "A2", "R2", 0).await;

    let detail: UserDetail = ctx.client.user_detail().await.unwrap();

    assert_eq!(detail.username, "ana");
    assert_eq!(ctx.requests().await.len(), 1);
    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_retried_once() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    mock_user_detail(&ctx, "A1", 401, 1).await;
    ctx.mock_refresh("R1", "A2", "R2", 1).await;
    mock_user_detail(&ctx, "A2", 200, 1).await;

    let detail = ctx.client.user_detail().await.unwrap();
    assert_eq!(detail.username, "ana");

    let requests = ctx.requests().await;
    let order: Vec<(String, Option<String>)> = requests
        .iter()
        .map(|r| (r.url.path().to_string(), access_token_of(r)))
        .collect();
    assert_eq!(
        order,
        vec![
            (api("/user/user-detail"), Some("A1".to_string())),
            (api("/auth/refresh/token"), None),
            (api("/user/user-detail"), Some("A2".to_string())),
        ]
    );

    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
    assert_eq!(ctx.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
    assert!(ctx.listener.notices().is_empty());
}

#[tokio::test]
async fn test_missing_refresh_token_expires_without_network() {
    let ctx = TestContext::with_tokens(Some("A1"), None).await;

    let err = ctx.client.user_detail().await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::SessionExpired(RefreshFailure::MissingRefreshToken)
    ));
    assert!(ctx.requests().await.is_empty());
    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(ctx.stored(CURRENT_USER_KEY), None);

    let notices = ctx.listener.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices.first().unwrap().login_url, "/login");
}

#[tokio::test]
async fn test_missing_access_token_refreshes_first() {
    let ctx = TestContext::with_tokens(None, Some("R1")).await;
    ctx.mock_refresh("R1", "A2", "R2", 1).await;
    mock_user_detail(&ctx, "A2", 200, 1).await;

    ctx.client.user_detail().await.unwrap();

    let paths: Vec<String> = ctx
        .requests()
        .await
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec![api("/auth/refresh/token"), api("/user/user-detail")]);
}

#[tokio::test]
async fn test_refreshed_token_rejected_on_first_call_is_final() {
    let ctx = TestContext::with_tokens(None, Some("R1")).await;
    ctx.mock_refresh("R1", "A2", "R2", 1).await;
    mock_user_detail(&ctx, "A2", 401, 1).await;

    let err = ctx.client.user_detail().await.unwrap_err();

    assert!(matches!(err, GatewayError::Unauthorized));
    assert_eq!(ctx.requests().await.len(), 2);
}

#[tokio::test]
async fn test_refresh_failure_clears_session_and_notifies() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    ctx.store.set(THEME_MODE_KEY, "dark").unwrap();
    mock_user_detail(&ctx, "A1", 401, 1).await;
    Mock::given(method("GET"))
        .and(path(api("/auth/refresh/token")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let err = ctx.client.user_detail().await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(matches!(
        err,
        GatewayError::SessionExpired(RefreshFailure::Rejected { status: 403 })
    ));
    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(ctx.stored(REFRESH_TOKEN_KEY), None);
    assert_eq!(ctx.stored(CURRENT_USER_KEY), None);
    assert_eq!(ctx.stored(THEME_MODE_KEY).as_deref(), Some("dark"));
    assert_eq!(ctx.listener.notices().len(), 1);
}

#[tokio::test]
async fn test_malformed_refresh_response_expires_session() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    mock_user_detail(&ctx, "A1", 401, 1).await;
    Mock::given(method("GET"))
        .and(path(api("/auth/refresh/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "A2"})))
        .mount(&ctx.server)
        .await;

    let err = ctx.client.user_detail().await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::SessionExpired(RefreshFailure::Malformed(_))
    ));
    assert_eq!(ctx.stored(REFRESH_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_unreachable_refresh_endpoint_expires_session() {
    // Nothing listens on port 1, so the refresh call fails to connect.
    let store = Arc::new(MemoryStore::with_entries([(REFRESH_TOKEN_KEY, "R1")]));
    let listener = Arc::new(RecordingListener::new());
    let config = ClientConfig::new(Url::parse("http://127.0.0.1:1/api").unwrap());
    let client = SalesoClient::new(&config, store.clone(), listener.clone()).unwrap();

    let err = client.user_detail().await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::SessionExpired(RefreshFailure::Transport(_))
    ));
    assert!(store.is_empty().unwrap());
    assert_eq!(listener.notices().len(), 1);
}

#[tokio::test]
async fn test_second_rejection_is_unauthorized_without_second_refresh() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    mock_user_detail(&ctx, "A1", 401, 1).await;
    ctx.mock_refresh("R1", "A2", "R2", 1).await;
    mock_user_detail(&ctx, "A2", 401, 1).await;

    let err = ctx.client.user_detail().await.unwrap_err();

    assert!(matches!(err, GatewayError::Unauthorized));
    assert_eq!(ctx.requests().await.len(), 3);
    // A final rejection does not end the session.
    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
    assert!(ctx.listener.notices().is_empty());
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    Mock::given(method("GET"))
        .and(path(api("/discount")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "database down"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/product/missing")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&ctx.server)
        .await;
    ctx.mock_refresh("R1", "A2", "R2", 0).await;

    let err = ctx.client.discounts().await.unwrap_err();
    match err {
        GatewayError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = ctx
        .client
        .product(&saleso_core::ProductId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    Mock::given(method("GET"))
        .and(path(api("/user/user-detail")))
        .and(header("accessToken", "A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/auth/refresh/token")))
        .and(header("refreshToken", "R1"))
        .respond_with(refreshed("A2", "R2").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    mock_user_detail(&ctx, "A2", 200, 5).await;

    let calls = (0..5).map(|_| ctx.client.user_detail());
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(ctx.requests_to("/auth/refresh/token").await.len(), 1);
    assert_eq!(ctx.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
}

#[tokio::test]
async fn test_empty_success_body_decodes_as_unit() {
    let ctx = TestContext::with_tokens(Some("A1"), Some("R1")).await;
    Mock::given(method("DELETE"))
        .and(path(api("/discount/d1")))
        .and(header("accessToken", "A1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.client
        .delete_discount(&saleso_core::DiscountId::new("d1"))
        .await
        .unwrap();
}
