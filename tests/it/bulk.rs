//! Bulk API 2.0 job lifecycle against a mock server.

use std::time::Duration;

use super::common::{credentials, job_json, mount_token, test_config};
use sfkit::bulk::ErrorKind;
use sfkit::{BulkApiClient, BulkRequest, JobState, JobType, PollOptions};
use wiremock::matchers::{any, body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOB_ID: &str = "7505g00000Lifecyc";
const INGEST: &str = "/services/data/v53.0/jobs/ingest";

fn job_path(suffix: &str) -> String {
    format!("{INGEST}/{JOB_ID}{suffix}")
}

async fn connected(server: &MockServer) -> BulkApiClient {
    BulkApiClient::connect(credentials(server), test_config())
        .await
        .expect("connect")
        .with_poll_options(PollOptions::every(Duration::from_millis(10)).with_max_attempts(20))
}

#[tokio::test]
async fn test_insert_account_end_to_end() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("POST"))
        .and(path(INGEST))
        .and(header("Authorization", "Bearer bulk-token"))
        .and(body_json(serde_json::json!({
            "object": "Account",
            "contentType": "CSV",
            "operation": "insert"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "Open")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(job_path("/batches")))
        .and(header("Content-Type", "text/csv"))
        .and(body_string("Name\nAcme Inc\n"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(job_path("")))
        .and(body_string(r#"{"state":"UploadComplete"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "UploadComplete")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(job_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "InProgress")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    let mut complete = job_json(JOB_ID, "JobComplete");
    complete["numberRecordsProcessed"] = 1.into();
    Mock::given(method("GET"))
        .and(path(job_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(job_path("/successfulResults")))
        .and(header("Accept", "text/csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(concat!(
                "\"sf__Id\",\"sf__Created\",Name\n",
                "\"001xx000003DGb2AAG\",\"true\",Acme Inc\n"
            )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = connected(&server).await;

    let created = client.create_job(&BulkRequest::insert("Account")).await.unwrap();
    assert_eq!(created.state, JobState::Open);

    client.upload_csv(&created.id, "Name\nAcme Inc\n").await.unwrap();

    let processing = client.process_job(JobType::Ingest, &created.id).await.unwrap();
    assert_eq!(processing.id, created.id);

    let mut states = Vec::new();
    let done = client
        .wait_for_job_with(
            JobType::Ingest,
            &created.id,
            client.poll_options(),
            |job| states.push(job.state),
        )
        .await
        .unwrap();
    assert_eq!(done.id, created.id);
    assert_eq!(done.state, JobState::JobComplete);
    assert_eq!(done.number_records_processed, 1);
    assert_eq!(states.last(), Some(&JobState::JobComplete));

    let results = client
        .get_successful_results(JobType::Ingest, &done.id)
        .await
        .unwrap();
    assert!(results.contains("001xx000003DGb2AAG"));
}

#[tokio::test]
async fn test_execute_ingest_reports_failed_job_without_results() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("POST"))
        .and(path(INGEST))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "Open")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "UploadComplete")))
        .mount(&server)
        .await;
    let mut failed = job_json(JOB_ID, "Failed");
    failed["errorMessage"] = "InvalidBatch : Field name not found : Nmae".into();
    Mock::given(method("GET"))
        .and(path(job_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(failed))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(job_path("/successfulResults")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    let result = client
        .execute_ingest(&BulkRequest::insert("Account"), "Nmae\nAcme Inc\n")
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(result.job.state, JobState::Failed);
    assert!(result.job.error_message.unwrap().contains("Nmae"));
    assert!(result.successful_results.is_none());
    assert!(result.failed_results.is_none());
}

#[tokio::test]
async fn test_list_jobs_single_record() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("GET"))
        .and(path(INGEST))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "done": true,
            "records": [job_json("750xx0000000001", "JobComplete")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    let page = client.list_jobs(JobType::Ingest).await.unwrap();

    assert!(page.done);
    assert!(page.next_records_url.is_none());
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].id, "750xx0000000001");
    assert_eq!(page.records[0].state, JobState::JobComplete);
}

#[tokio::test]
async fn test_cancel_job_sends_aborted_state() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("PATCH"))
        .and(path(job_path("")))
        .and(body_string(r#"{"state":"Aborted"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "Aborted")))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    let job = client.cancel_job(JobType::Ingest, JOB_ID).await.unwrap();
    assert_eq!(job.id, JOB_ID);
    assert_eq!(job.state, JobState::Aborted);
}

#[tokio::test]
async fn test_upsert_without_external_id_never_reaches_network() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(any())
        .and(path(INGEST))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    for request in [
        BulkRequest::upsert("Account", ""),
        BulkRequest::new("Account", sfkit::BulkOperation::Upsert),
    ] {
        let err = client.create_job(&request).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));
    }
}

#[tokio::test]
async fn test_polling_stops_on_aborted() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("GET"))
        .and(path(job_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "InProgress")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(job_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(JOB_ID, "Aborted")))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    let job = client
        .wait_for_job(JobType::Ingest, JOB_ID, client.poll_options())
        .await
        .unwrap();
    assert_eq!(job.state, JobState::Aborted);
}

#[tokio::test]
async fn test_second_upload_is_rejected_locally() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("PUT"))
        .and(path(job_path("/batches")))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected(&server).await;
    client.upload_csv(JOB_ID, "Name\nFirst\n").await.unwrap();
    let err = client.upload_csv(JOB_ID, "Name\nSecond\n").await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidState(_)));
}

#[tokio::test]
async fn test_platform_rejection_is_typed() {
    let server = MockServer::start().await;
    mount_token(&server, "bulk-token", 1).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!([{
            "errorCode": "INVALIDJOBSTATE",
            "message": "Aborting already Completed Job not allowed"
        }])))
        .mount(&server)
        .await;

    let client = connected(&server).await;
    let err = client.cancel_job(JobType::Ingest, JOB_ID).await.unwrap_err();

    let client_err = err.client_error().expect("transport error is kept as source");
    assert_eq!(client_err.api_kind(), Some(sfkit::client::ApiErrorKind::Conflict));
    assert!(err.to_string().contains("Aborting already Completed Job not allowed"));
}
