//! Token acquisition, caching and invalidation through a live client.

use std::sync::Arc;

use super::common::{credentials, mount_token, test_config, token_body, TOKEN_PATH};
use sfkit::auth::{ErrorKind, TokenManager};
use sfkit::client::ErrorKind as ClientErrorKind;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_connect_reuses_token_across_calls() {
    let server = MockServer::start().await;
    mount_token(&server, "cached-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v53.0/limits"))
        .and(header("Authorization", "Bearer cached-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(5)
        .mount(&server)
        .await;

    let client = sfkit::auth::connect(credentials(&server), test_config())
        .await
        .expect("connect should succeed");

    for _ in 0..5 {
        let _: serde_json::Value = client.rest_get("limits").await.expect("limits");
    }
}

#[tokio::test]
async fn test_concurrent_first_use_exchanges_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("single-flight"))
                .set_delay(std::time::Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer single-flight"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(8)
        .mount(&server)
        .await;

    let manager = Arc::new(TokenManager::new(credentials(&server)).expect("manager"));
    let client = manager
        .client(&server.uri(), test_config())
        .expect("client");

    let calls = (0..8).map(|_| {
        let client = client.clone();
        async move { client.rest_get::<serde_json::Value>("limits").await }
    });
    for result in futures::future::join_all(calls).await {
        result.expect("every caller shares the one token");
    }
}

#[tokio::test]
async fn test_unauthorized_response_refreshes_token() {
    let server = MockServer::start().await;
    mount_token(&server, "rotating", 2).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!([{
            "message": "Session expired or invalid",
            "errorCode": "INVALID_SESSION_ID"
        }])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = sfkit::auth::connect(credentials(&server), test_config())
        .await
        .expect("connect");

    let err = client
        .rest_get::<serde_json::Value>("limits")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    match &err.kind {
        ClientErrorKind::Api(api) => {
            assert_eq!(api.error_code.as_deref(), Some("INVALID_SESSION_ID"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // The 401 dropped the cached token; this call exchanges again.
    let value: serde_json::Value = client.rest_get("limits").await.expect("retry by caller");
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_bad_credentials_fail_at_connect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = sfkit::auth::connect(credentials(&server), test_config())
        .await
        .unwrap_err();
    match err.kind {
        ErrorKind::OAuth { error, .. } => assert_eq!(error, "invalid_grant"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_token_failure_surfaces_as_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_client_id",
            "error_description": "client identifier invalid"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = Arc::new(TokenManager::new(credentials(&server)).expect("manager"));
    let client = manager.client(&server.uri(), test_config()).expect("client");

    let err = client
        .rest_get::<serde_json::Value>("limits")
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.to_string().contains("invalid_client_id"));
}

#[tokio::test]
async fn test_connect_is_bounded_by_client_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("too-late"))
                .set_delay(std::time::Duration::from_secs(6)),
        )
        .mount(&server)
        .await;

    let config = sfkit::ClientConfig::builder()
        .with_timeout(std::time::Duration::from_millis(500))
        .build();
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(4),
        sfkit::auth::connect(credentials(&server), config),
    )
    .await;

    let err = outcome
        .expect("connect returns once the client timeout elapses")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Http(_)));
}
