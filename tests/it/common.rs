use sfkit::auth::PasswordCredentials;
use sfkit::{ClientConfig, RateLimitConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/services/oauth2/token";

/// Token endpoint success body for `access_token`.
pub fn token_body(access_token: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "instance_url": "https://na1.salesforce.com",
        "id": "https://login.salesforce.com/id/00Dxx0000001gEF/005xx000001Sv6e",
        "token_type": "Bearer",
        "issued_at": "1700000000000",
        "signature": "c2lnbmF0dXJl"
    })
}

/// Mount a token endpoint that must be hit exactly `times` times.
pub async fn mount_token(server: &MockServer, access_token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token)))
        .expect(times)
        .mount(server)
        .await;
}

/// Credentials whose base URL is the mock server.
pub fn credentials(server: &MockServer) -> PasswordCredentials {
    PasswordCredentials::new(
        server.uri(),
        "integration@example.com",
        "hunter2",
        "3MVG9client",
        "client-secret",
    )
    .expect("mock credentials are valid")
}

/// Client config with a limiter loose enough not to slow tests down.
pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .with_rate_limit(RateLimitConfig::per_second(1000))
        .build()
}

/// A job record in `state`.
pub fn job_json(id: &str, state: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "operation": "insert",
        "object": "Account",
        "createdById": "005xx000001Sv6eAAC",
        "createdDate": "2023-04-01T12:00:00.000+0000",
        "systemModstamp": "2023-04-01T12:00:05.000+0000",
        "state": state,
        "concurrencyMode": "Parallel",
        "contentType": "CSV",
        "apiVersion": 53.0,
        "jobType": "V2Ingest",
        "lineEnding": "LF",
        "columnDelimiter": "COMMA",
        "numberRecordsProcessed": 0,
        "numberRecordsFailed": 0,
        "retries": 0
    })
}
