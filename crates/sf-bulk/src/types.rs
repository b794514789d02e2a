//! Types for Bulk API 2.0.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Deserialize API version that can be either a float (53.0) or string ("53.0").
pub(crate) fn deserialize_api_version<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API 2.0 job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting data
    Open,
    /// Upload is complete, job is ready for processing
    UploadComplete,
    /// Job is processing
    InProgress,
    /// Job was aborted
    Aborted,
    /// Job completed successfully
    JobComplete,
    /// Job failed
    Failed,
}

impl JobState {
    /// Check if job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Aborted | JobState::JobComplete | JobState::Failed
        )
    }

    /// Check if job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::JobComplete)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobState::Open => "Open",
            JobState::UploadComplete => "UploadComplete",
            JobState::InProgress => "InProgress",
            JobState::Aborted => "Aborted",
            JobState::JobComplete => "JobComplete",
            JobState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Family of jobs, which selects the `jobs/{type}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Data loads: insert, update, upsert, delete, hardDelete.
    Ingest,
    /// Extracts: query, queryAll.
    Query,
}

impl JobType {
    /// Path segment for this job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Ingest => "ingest",
            JobType::Query => "query",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bulk API 2.0 operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    /// Insert new records
    Insert,
    /// Update existing records
    Update,
    /// Upsert based on external ID
    Upsert,
    /// Delete records (soft delete)
    Delete,
    /// Hard delete records (permanent)
    HardDelete,
    /// Query records
    Query,
    /// Query all records including deleted
    QueryAll,
}

impl BulkOperation {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
            BulkOperation::HardDelete => "hardDelete",
            BulkOperation::Query => "query",
            BulkOperation::QueryAll => "queryAll",
        }
    }

    /// Check if this is a query operation.
    pub fn is_query(&self) -> bool {
        matches!(self, BulkOperation::Query | BulkOperation::QueryAll)
    }

    /// Check if this is an ingest operation.
    pub fn is_ingest(&self) -> bool {
        !self.is_query()
    }

    /// The job type this operation runs under.
    pub fn job_type(&self) -> JobType {
        if self.is_query() {
            JobType::Query
        } else {
            JobType::Ingest
        }
    }
}

/// Content type for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

/// Line ending style for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    /// Unix-style (LF)
    #[default]
    #[serde(rename = "LF")]
    Lf,
    /// Windows-style (CRLF)
    #[serde(rename = "CRLF")]
    Crlf,
}

/// Column delimiter for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnDelimiter {
    #[default]
    #[serde(rename = "COMMA")]
    Comma,
    #[serde(rename = "TAB")]
    Tab,
    #[serde(rename = "SEMICOLON")]
    Semicolon,
    #[serde(rename = "PIPE")]
    Pipe,
    #[serde(rename = "BACKQUOTE")]
    Backquote,
    #[serde(rename = "CARET")]
    Caret,
}

impl ColumnDelimiter {
    /// Get the actual delimiter byte.
    pub fn byte(&self) -> u8 {
        match self {
            ColumnDelimiter::Comma => b',',
            ColumnDelimiter::Tab => b'\t',
            ColumnDelimiter::Semicolon => b';',
            ColumnDelimiter::Pipe => b'|',
            ColumnDelimiter::Backquote => b'`',
            ColumnDelimiter::Caret => b'^',
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Job-creation descriptor, serialized as the body of `POST jobs/{type}`.
///
/// Unset optional fields are omitted so the platform applies its defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    /// SObject API name (ingest jobs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Content type, always CSV
    pub content_type: ContentType,
    /// Operation type
    pub operation: BulkOperation,
    /// Line ending override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_ending: Option<LineEnding>,
    /// Column delimiter override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_delimiter: Option<ColumnDelimiter>,
    /// External ID field, upsert only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    /// SOQL text, query jobs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl BulkRequest {
    /// Create an ingest request for `sobject`.
    pub fn new(sobject: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: Some(sobject.into()),
            content_type: ContentType::Csv,
            operation,
            line_ending: None,
            column_delimiter: None,
            external_id_field_name: None,
            query: None,
        }
    }

    /// Insert request.
    pub fn insert(sobject: impl Into<String>) -> Self {
        Self::new(sobject, BulkOperation::Insert)
    }

    /// Upsert request keyed on `external_id_field`.
    pub fn upsert(sobject: impl Into<String>, external_id_field: impl Into<String>) -> Self {
        Self::new(sobject, BulkOperation::Upsert).with_external_id_field(external_id_field)
    }

    /// Query request.
    pub fn query(soql: impl Into<String>) -> Self {
        Self {
            object: None,
            content_type: ContentType::Csv,
            operation: BulkOperation::Query,
            line_ending: None,
            column_delimiter: None,
            external_id_field_name: None,
            query: Some(soql.into()),
        }
    }

    /// Use queryAll instead of query (includes deleted records).
    pub fn with_query_all(mut self) -> Self {
        if self.operation.is_query() {
            self.operation = BulkOperation::QueryAll;
        }
        self
    }

    /// Set the external ID field for upsert operations.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    /// Set the column delimiter.
    pub fn with_column_delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.column_delimiter = Some(delimiter);
        self
    }

    /// Set the line ending.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = Some(line_ending);
        self
    }

    /// The job type this request creates.
    pub fn job_type(&self) -> JobType {
        self.operation.job_type()
    }

    /// Check the request before it is sent.
    ///
    /// - ingest operations need an object name
    /// - query operations need query text
    /// - upsert needs a non-empty external ID field, and no other operation
    ///   may carry one
    pub fn validate(&self) -> Result<()> {
        let present =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

        if self.operation.is_ingest() && !present(&self.object) {
            return Err(validation(format!(
                "{} requires an object name",
                self.operation.api_name()
            )));
        }

        if self.operation.is_query() && !present(&self.query) {
            return Err(validation(format!(
                "{} requires query text",
                self.operation.api_name()
            )));
        }

        match (self.operation, &self.external_id_field_name) {
            (BulkOperation::Upsert, field) if !present(field) => Err(validation(
                "upsert requires a non-empty external ID field".to_string(),
            )),
            (BulkOperation::Upsert, _) | (_, None) => Ok(()),
            (operation, Some(_)) => Err(validation(format!(
                "external ID field is only valid for upsert, not {}",
                operation.api_name()
            ))),
        }
    }
}

fn validation(message: String) -> Error {
    Error::new(ErrorKind::Validation(message))
}

/// Request to change job state.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateJobStateRequest {
    state: JobState,
}

impl UpdateJobStateRequest {
    pub(crate) fn upload_complete() -> Self {
        Self {
            state: JobState::UploadComplete,
        }
    }

    pub(crate) fn abort() -> Self {
        Self {
            state: JobState::Aborted,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// The platform's job record. Every fetch is a fresh snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Job ID
    pub id: String,
    /// Current state
    pub state: JobState,
    /// Operation type
    #[serde(default)]
    pub operation: Option<BulkOperation>,
    /// SObject API name
    #[serde(default)]
    pub object: Option<String>,
    /// Creator user id
    #[serde(default)]
    pub created_by_id: Option<String>,
    /// Job creation time, as sent by the platform
    #[serde(default)]
    pub created_date: Option<String>,
    /// Last modification time, as sent by the platform
    #[serde(default)]
    pub system_modstamp: Option<String>,
    /// Concurrency mode
    #[serde(default)]
    pub concurrency_mode: Option<String>,
    /// Content type
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// API version (can be float like 53.0 or string like "53.0")
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    /// Platform job type, e.g. "V2Ingest"
    #[serde(default)]
    pub job_type: Option<String>,
    /// Line ending
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
    /// Column delimiter
    #[serde(default)]
    pub column_delimiter: Option<ColumnDelimiter>,
    /// External ID field for upserts
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    /// Number of records processed
    #[serde(default)]
    pub number_records_processed: i64,
    /// Number of records failed
    #[serde(default)]
    pub number_records_failed: i64,
    /// Number of retries
    #[serde(default)]
    pub retries: i64,
    /// Total processing time in milliseconds
    #[serde(default)]
    pub total_processing_time: Option<i64>,
    /// Error message if failed
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobInfo {
    /// Parsed creation time.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created_date.as_deref().and_then(parse_platform_timestamp)
    }

    /// Parsed last-modified time.
    pub fn modified_at(&self) -> Option<DateTime<FixedOffset>> {
        self.system_modstamp.as_deref().and_then(parse_platform_timestamp)
    }

    /// Wall time between creation and the last modification.
    pub fn elapsed(&self) -> Option<chrono::TimeDelta> {
        Some(self.modified_at()? - self.created_at()?)
    }
}

/// The platform writes `2023-04-01T12:00:00.000+0000`; RFC 3339 is accepted too.
fn parse_platform_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// One page of the job listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkListResponse {
    /// True when there are no further pages.
    #[serde(default)]
    pub done: bool,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next_records_url: Option<String>,
    /// Jobs in server order.
    #[serde(default)]
    pub records: Vec<JobInfo>,
}

// =============================================================================
// Polling
// =============================================================================

/// Default polling interval for job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How [`crate::BulkApiClient::wait_for_job`] polls.
///
/// Without `max_attempts` or `deadline` the wait is bounded only by the job
/// reaching a terminal state or the client's cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Sleep before each status fetch. Must be non-zero.
    pub interval: Duration,
    /// Maximum number of status fetches.
    pub max_attempts: Option<u32>,
    /// Maximum total wait.
    pub deadline: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            deadline: None,
        }
    }
}

impl PollOptions {
    /// Poll every `interval` with no bound.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Give up after `attempts` fetches.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Give up once `deadline` has elapsed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Result of a completed ingest job.
#[derive(Debug, Clone)]
pub struct IngestJobResult {
    /// The job in its terminal state
    pub job: JobInfo,
    /// Successful records CSV, fetched when the job completed
    pub successful_results: Option<String>,
    /// Failed records CSV, fetched when the job completed
    pub failed_results: Option<String>,
}

impl IngestJobResult {
    /// Check if the job succeeded.
    pub fn is_success(&self) -> bool {
        self.job.state.is_success()
    }

    /// Get the success rate.
    pub fn success_rate(&self) -> f64 {
        let total = self.job.number_records_processed;
        if total == 0 {
            return 1.0;
        }
        (total - self.job.number_records_failed) as f64 / total as f64
    }

    /// Check if there were any failures.
    pub fn has_failures(&self) -> bool {
        self.job.number_records_failed > 0
    }
}
