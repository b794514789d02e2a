//! Object describe through a connected client.

use super::common::{credentials, mount_token, test_config};
use sfkit::rest::ErrorKind;
use sfkit::SalesforceRestClient;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account_describe() -> serde_json::Value {
    serde_json::json!({
        "name": "Account",
        "label": "Account",
        "labelPlural": "Accounts",
        "keyPrefix": "001",
        "custom": false,
        "createable": true,
        "queryable": true,
        "updateable": true,
        "fields": [
            {"name": "Id", "type": "id", "idLookup": true, "length": 18},
            {"name": "Name", "type": "string", "nameField": true, "length": 255},
            {"name": "Legacy_Key__c", "type": "string", "custom": true, "externalId": true},
            {
                "name": "Industry",
                "type": "picklist",
                "picklistValues": [
                    {"value": "Banking", "label": "Banking", "active": true},
                    {"value": "Telex", "label": "Telex", "active": false}
                ]
            }
        ],
        "recordTypeInfos": [],
        "urls": {"sobject": "/services/data/v53.0/sobjects/Account"}
    })
}

async fn connected(server: &MockServer) -> SalesforceRestClient {
    let client = sfkit::auth::connect(credentials(server), test_config())
        .await
        .expect("connect");
    SalesforceRestClient::from_client(client)
}

#[tokio::test]
async fn test_describe_account_through_connect() {
    let server = MockServer::start().await;
    mount_token(&server, "describe-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v53.0/sobjects/Account/describe"))
        .and(header("Authorization", "Bearer describe-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_describe()))
        .expect(2)
        .mount(&server)
        .await;

    let rest = connected(&server).await;
    let describe = rest.describe_account().await.unwrap();

    assert_eq!(describe.name, "Account");
    assert_eq!(describe.key_prefix.as_deref(), Some("001"));
    assert!(describe.queryable);
    assert_eq!(describe.fields.len(), 4);
    assert!(describe.field("name").is_some_and(|f| f.name_field));

    let external: Vec<_> = describe.external_id_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(external, ["Legacy_Key__c"]);

    let industry = describe.field("Industry").unwrap();
    assert_eq!(industry.active_picklist_values().count(), 1);

    // Same token, second request.
    let again = rest.describe_sobject("Account").await.unwrap();
    assert_eq!(again.name, describe.name);
}

#[tokio::test]
async fn test_describe_custom_object() {
    let server = MockServer::start().await;
    mount_token(&server, "describe-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v53.0/sobjects/Widget__c/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Widget__c",
            "custom": true,
            "fields": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rest = connected(&server).await;
    let describe = rest.describe_sobject("Widget__c").await.unwrap();
    assert!(describe.custom);
    assert!(describe.fields.is_empty());
}

#[tokio::test]
async fn test_unsafe_object_name_is_rejected_before_request() {
    let server = MockServer::start().await;
    mount_token(&server, "describe-token", 1).await;

    Mock::given(any())
        .and(wiremock::matchers::path_regex("^/services/data/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let rest = connected(&server).await;
    let err = rest.describe_sobject("Account/../limits").await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidSObject(_)));
}

#[tokio::test]
async fn test_describe_forbidden_is_typed() {
    let server = MockServer::start().await;
    mount_token(&server, "describe-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v53.0/sobjects/Secret__c/describe"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!([{
            "errorCode": "INSUFFICIENT_ACCESS",
            "message": "insufficient access rights on object id"
        }])))
        .mount(&server)
        .await;

    let rest = connected(&server).await;
    let err = rest.describe_sobject("Secret__c").await.unwrap_err();
    assert_eq!(
        err.client_error().and_then(|e| e.api_kind()),
        Some(sfkit::client::ApiErrorKind::Forbidden)
    );
}
