//! Bulk API 2.0 client.
//!
//! Provides the job lifecycle of Bulk API 2.0: create, upload, process,
//! poll, fetch results and cancel. Every operation is one request issued
//! strictly in the order the caller invokes it; the platform enforces the
//! job state machine.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

use sfkit_auth::PasswordCredentials;
use sfkit_client::security::url::encode_param;
use sfkit_client::{ClientConfig, SalesforceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::types::*;

/// Salesforce Bulk API 2.0 client.
///
/// Clones share the underlying client (limiter and token) and the
/// single-upload guard.
///
/// # Example
///
/// ```rust,ignore
/// use sfkit_bulk::{BulkApiClient, BulkRequest, JobType, PollOptions};
///
/// let client = BulkApiClient::new(
///     "https://myorg.my.salesforce.com",
///     "access_token_here",
/// )?;
///
/// let job = client.create_job(&BulkRequest::insert("Account")).await?;
/// client.upload_csv(&job.id, "Name\nTest Account 1\nTest Account 2\n").await?;
/// client.process_job(JobType::Ingest, &job.id).await?;
/// let done = client
///     .wait_for_job(JobType::Ingest, &job.id, &PollOptions::default())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkApiClient {
    client: SalesforceClient,
    poll_options: PollOptions,
    uploaded: Arc<Mutex<HashSet<String>>>,
}

impl BulkApiClient {
    /// Create a new Bulk API client.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(base_url, access_token)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Bulk API client with custom HTTP configuration.
    pub fn with_config(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(base_url, access_token, config)?;
        Ok(Self::from_client(client))
    }

    /// Authenticate with the password grant and build a client on the
    /// credentials' base URL. Tokens are cached and refreshed as needed.
    pub async fn connect(credentials: PasswordCredentials, config: ClientConfig) -> Result<Self> {
        let client = sfkit_auth::connect(credentials, config).await?;
        Ok(Self::from_client(client))
    }

    /// Create a Bulk API client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self {
            client,
            poll_options: PollOptions::default(),
            uploaded: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Get the underlying SalesforceClient.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }

    /// Set the polling policy used by [`Self::execute_ingest`].
    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    /// The polling policy used by [`Self::execute_ingest`].
    pub fn poll_options(&self) -> &PollOptions {
        &self.poll_options
    }

    fn job_url(&self, job_type: JobType, job_id: &str) -> Result<String> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(Error::new(ErrorKind::Validation(
                "job id is required".to_string(),
            )));
        }
        Ok(format!(
            "{}/{}",
            self.client.bulk_url(job_type.as_str()),
            encode_param(job_id)
        ))
    }

    // =========================================================================
    // Job Operations
    // =========================================================================

    /// Create a job. The job type is derived from the request's operation.
    ///
    /// The request is validated first; an invalid request never reaches the
    /// network.
    #[instrument(skip(self, request), fields(operation = request.operation.api_name()))]
    pub async fn create_job(&self, request: &BulkRequest) -> Result<JobInfo> {
        request.validate()?;
        let url = self.client.bulk_url(request.job_type().as_str());
        let job: JobInfo = self.client.post_json(&url, request).await?;
        info!(job_id = %job.id, state = %job.state, "Created bulk job");
        Ok(job)
    }

    /// Upload the job's CSV data.
    ///
    /// A job takes exactly one upload. A second upload for the same job id
    /// through this client (or any clone) fails with
    /// [`ErrorKind::InvalidState`] without a request; a failed upload may be
    /// retried.
    #[instrument(skip(self, csv_data))]
    pub async fn upload_csv(&self, job_id: &str, csv_data: impl Into<Bytes>) -> Result<()> {
        let url = format!("{}/batches", self.job_url(JobType::Ingest, job_id)?);
        let csv_data = csv_data.into();
        check_csv(&csv_data)?;

        let job_id = job_id.trim().to_string();
        self.claim_upload(&job_id)?;

        let size = csv_data.len();
        let request = self.client.put(&url).csv(csv_data);
        match self.client.execute(request).await {
            Ok(_) => {
                debug!(job_id = %job_id, bytes = size, "Uploaded job data");
                Ok(())
            }
            Err(err) => {
                self.release_upload(&job_id);
                Err(err.into())
            }
        }
    }

    /// Read a CSV file and upload it with [`Self::upload_csv`].
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn upload_csv_file(&self, job_id: &str, path: impl AsRef<Path>) -> Result<()> {
        let data = tokio::fs::read(path.as_ref()).await?;
        self.upload_csv(job_id, data).await
    }

    /// Mark upload complete so the platform starts processing.
    #[instrument(skip(self))]
    pub async fn process_job(&self, job_type: JobType, job_id: &str) -> Result<JobInfo> {
        let url = self.job_url(job_type, job_id)?;
        let job: JobInfo = self
            .client
            .patch_json(&url, &UpdateJobStateRequest::upload_complete())
            .await?;
        info!(job_id = %job.id, state = %job.state, "Job queued for processing");
        Ok(job)
    }

    /// Get the current job snapshot.
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_type: JobType, job_id: &str) -> Result<JobInfo> {
        let url = self.job_url(job_type, job_id)?;
        Ok(self.client.get_json(&url).await?)
    }

    /// List the first page of jobs of a type, in server order.
    ///
    /// Further pages are not fetched; pass `next_records_url` to
    /// [`Self::list_jobs_page`] to follow them.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, job_type: JobType) -> Result<BulkListResponse> {
        let url = self.client.bulk_url(job_type.as_str());
        Ok(self.client.get_json(&url).await?)
    }

    /// Fetch a listing page by its `nextRecordsUrl`.
    #[instrument(skip(self))]
    pub async fn list_jobs_page(&self, next_records_url: &str) -> Result<BulkListResponse> {
        if next_records_url.trim().is_empty() {
            return Err(Error::new(ErrorKind::Validation(
                "next records URL is required".to_string(),
            )));
        }
        Ok(self.client.get_json(next_records_url).await?)
    }

    /// Abort a job.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_type: JobType, job_id: &str) -> Result<JobInfo> {
        let url = self.job_url(job_type, job_id)?;
        let job: JobInfo = self
            .client
            .patch_json(&url, &UpdateJobStateRequest::abort())
            .await?;
        info!(job_id = %job.id, state = %job.state, "Aborted bulk job");
        self.forget_if_terminal(job_id, &job);
        Ok(job)
    }

    /// Get successful records as raw CSV.
    #[instrument(skip(self))]
    pub async fn get_successful_results(&self, job_type: JobType, job_id: &str) -> Result<String> {
        self.get_csv(job_type, job_id, "successfulResults").await
    }

    /// Get failed records as raw CSV.
    #[instrument(skip(self))]
    pub async fn get_failed_results(&self, job_type: JobType, job_id: &str) -> Result<String> {
        self.get_csv(job_type, job_id, "failedResults").await
    }

    /// Get records the platform never processed as raw CSV.
    #[instrument(skip(self))]
    pub async fn get_unprocessed_records(&self, job_type: JobType, job_id: &str) -> Result<String> {
        self.get_csv(job_type, job_id, "unprocessedrecords").await
    }

    async fn get_csv(&self, job_type: JobType, job_id: &str, resource: &str) -> Result<String> {
        let url = format!("{}/{}", self.job_url(job_type, job_id)?, resource);
        Ok(self.client.get_text(&url, "text/csv").await?)
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Poll until the job reaches a terminal state and return that snapshot.
    ///
    /// `JobComplete`, `Aborted` and `Failed` all end the wait; check
    /// `job.state` for the outcome.
    pub async fn wait_for_job(
        &self,
        job_type: JobType,
        job_id: &str,
        options: &PollOptions,
    ) -> Result<JobInfo> {
        self.wait_for_job_with(job_type, job_id, options, |_| {}).await
    }

    /// Like [`Self::wait_for_job`], reporting every snapshot to `on_status`.
    ///
    /// Each round sleeps `interval` and then fetches. Fails with
    /// [`ErrorKind::Timeout`] once `max_attempts` or `deadline` is exhausted
    /// and with [`ErrorKind::Cancelled`] when the client's cancellation token
    /// fires.
    #[instrument(skip(self, options, on_status))]
    pub async fn wait_for_job_with<F>(
        &self,
        job_type: JobType,
        job_id: &str,
        options: &PollOptions,
        mut on_status: F,
    ) -> Result<JobInfo>
    where
        F: FnMut(&JobInfo),
    {
        if options.interval.is_zero() {
            return Err(Error::new(ErrorKind::Validation(
                "poll interval must be non-zero".to_string(),
            )));
        }

        let deadline = options.deadline.map(|d| Instant::now() + d);
        let mut attempts: u32 = 0;

        loop {
            if let Some(max) = options.max_attempts {
                if attempts >= max {
                    return Err(Error::new(ErrorKind::Timeout(format!(
                        "job {} not finished after {} status checks",
                        job_id, attempts
                    ))));
                }
            }
            if deadline.is_some_and(|d| Instant::now() + options.interval > d) {
                return Err(Error::new(ErrorKind::Timeout(format!(
                    "job {} not finished within {:?}",
                    job_id,
                    options.deadline.unwrap_or_default()
                ))));
            }

            self.pause(options.interval).await?;
            attempts += 1;

            let job = self.get_job(job_type, job_id).await?;
            debug!(job_id = %job.id, state = %job.state, attempt = attempts, "Polled job");
            on_status(&job);

            if job.state.is_terminal() {
                info!(job_id = %job.id, state = %job.state, "Job reached terminal state");
                self.forget_if_terminal(job_id, &job);
                return Ok(job);
            }
        }
    }

    async fn pause(&self, interval: std::time::Duration) -> Result<()> {
        match self.client.cancellation() {
            Some(cancel) => tokio::select! {
                _ = sleep(interval) => Ok(()),
                _ = cancel.cancelled() => Err(Error::new(ErrorKind::Cancelled)),
            },
            None => {
                sleep(interval).await;
                Ok(())
            }
        }
    }

    // =========================================================================
    // High-Level Operations
    // =========================================================================

    /// Execute a complete ingest operation.
    ///
    /// Creates the job, uploads `csv_data`, starts processing, waits with the
    /// client's [`PollOptions`] and, when the job completed, fetches both
    /// result sets.
    #[instrument(skip(self, request, csv_data), fields(operation = request.operation.api_name()))]
    pub async fn execute_ingest(
        &self,
        request: &BulkRequest,
        csv_data: impl Into<Bytes>,
    ) -> Result<IngestJobResult> {
        if request.operation.is_query() {
            return Err(Error::new(ErrorKind::Validation(format!(
                "{} is not an ingest operation",
                request.operation.api_name()
            ))));
        }
        request.validate()?;
        let csv_data = csv_data.into();
        check_csv(&csv_data)?;

        let job = self.create_job(request).await?;
        self.upload_csv(&job.id, csv_data).await?;
        self.process_job(JobType::Ingest, &job.id).await?;

        let completed = self
            .wait_for_job(JobType::Ingest, &job.id, &self.poll_options)
            .await?;

        let (successful_results, failed_results) = if completed.state.is_success() {
            (
                Some(self.get_successful_results(JobType::Ingest, &job.id).await?),
                Some(self.get_failed_results(JobType::Ingest, &job.id).await?),
            )
        } else {
            (None, None)
        };

        Ok(IngestJobResult {
            job: completed,
            successful_results,
            failed_results,
        })
    }

    // =========================================================================
    // Upload guard
    // =========================================================================

    fn claim_upload(&self, job_id: &str) -> Result<()> {
        let mut uploaded = self
            .uploaded
            .lock()
            .map_err(|_| Error::new(ErrorKind::InvalidState("upload guard poisoned".to_string())))?;
        if !uploaded.insert(job_id.to_string()) {
            return Err(Error::new(ErrorKind::InvalidState(format!(
                "job {} already has its data uploaded",
                job_id
            ))));
        }
        Ok(())
    }

    fn release_upload(&self, job_id: &str) {
        if let Ok(mut uploaded) = self.uploaded.lock() {
            uploaded.remove(job_id);
        }
    }

    /// A finished job takes no more uploads, so its guard entry can go.
    fn forget_if_terminal(&self, job_id: &str, job: &JobInfo) {
        if job.state.is_terminal() {
            self.release_upload(job_id.trim());
        }
    }
}

/// Reject payloads that cannot be a job upload: empty, or no header row.
fn check_csv(data: &[u8]) -> Result<()> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::new(ErrorKind::Validation(
            "CSV payload is empty".to_string(),
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let headers = reader.byte_headers()?;
    if headers.iter().all(|h| h.iter().all(u8::is_ascii_whitespace)) {
        return Err(Error::new(ErrorKind::Validation(
            "CSV payload has no header row".to_string(),
        )));
    }
    Ok(())
}
