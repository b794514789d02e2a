//! Rate limiting, error translation and cancellation across the pipeline.

use std::time::{Duration, Instant};

use super::common::test_config;
use sfkit::client::{ApiErrorKind, ErrorKind};
use sfkit::{CancellationToken, ClientConfig, RateLimitConfig, SalesforceClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_status_table() {
    let server = MockServer::start().await;
    let table = [
        (300, ApiErrorKind::MultipleExternalIdMatch),
        (304, ApiErrorKind::NotModified),
        (400, ApiErrorKind::BadRequest),
        (401, ApiErrorKind::Unauthorized),
        (403, ApiErrorKind::Forbidden),
        (405, ApiErrorKind::MethodNotAllowed),
        (409, ApiErrorKind::Conflict),
        (500, ApiErrorKind::InternalError),
        (418, ApiErrorKind::Unknown),
        (503, ApiErrorKind::Unknown),
    ];

    for (status, _) in table {
        Mock::given(method("GET"))
            .and(path(format!("/status/{status}")))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = SalesforceClient::with_config(server.uri(), "token", test_config()).unwrap();
    for (status, kind) in table {
        let err = client
            .get_json::<serde_json::Value>(&format!("/status/{status}"))
            .await
            .unwrap_err();
        assert_eq!(err.api_kind(), Some(kind), "status {status}");
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.to_string(), format!("salesforce: {}", kind.as_str()));
    }
}

#[tokio::test]
async fn test_enriched_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!([{
            "message": "Required fields are missing: [Name]",
            "errorCode": "REQUIRED_FIELD_MISSING",
            "fields": ["Name"]
        }])))
        .mount(&server)
        .await;

    let client = SalesforceClient::with_config(server.uri(), "token", test_config()).unwrap();
    let err = client
        .post_json::<serde_json::Value, _>(
            &client.rest_url("sobjects/Account"),
            &serde_json::json!({}),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "salesforce: bad request: Required fields are missing: [Name] Name"
    );
    match err.kind {
        ErrorKind::Api(api) => {
            assert_eq!(api.error_code.as_deref(), Some("REQUIRED_FIELD_MISSING"));
            assert_eq!(api.fields, ["Name"]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_error_body_keeps_base_kind() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<html>Forbidden</html>"))
        .mount(&server)
        .await;

    let client = SalesforceClient::with_config(server.uri(), "token", test_config()).unwrap();
    let err = client
        .get_json::<serde_json::Value>("/anything")
        .await
        .unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Forbidden));
    assert_eq!(err.to_string(), "salesforce: forbidden");
}

#[tokio::test]
async fn test_limiter_is_shared_by_clones() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(6)
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .with_rate_limit(RateLimitConfig::per_second(20))
        .build();
    let client = SalesforceClient::with_config(server.uri(), "token", config).unwrap();

    let start = Instant::now();
    let calls = (0..6).map(|_| {
        let client = client.clone();
        async move { client.get_json::<serde_json::Value>("/ping").await }
    });
    for result in futures::future::join_all(calls).await {
        result.unwrap();
    }

    // Six admissions at 50ms spacing, the first immediate.
    assert!(start.elapsed() >= Duration::from_millis(250), "{:?}", start.elapsed());
}

#[tokio::test]
async fn test_client_cancellation_stops_in_flight_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let client = SalesforceClient::with_config(server.uri(), "token", test_config())
        .unwrap()
        .with_cancellation(cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = client
        .get_json::<serde_json::Value>("/slow")
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_no_content_is_not_a_decode_error_for_send_json() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = SalesforceClient::with_config(server.uri(), "token", test_config()).unwrap();
    let request = client
        .patch(&client.rest_url("sobjects/Account/001xx000003DGb2AAG"))
        .json(&serde_json::json!({"Name": "Renamed"}))
        .unwrap();
    let body: Option<serde_json::Value> = client.send_json(request).await.unwrap();
    assert!(body.is_none());
}
