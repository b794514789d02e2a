//! # sfkit-bulk
//!
//! Salesforce Bulk API 2.0 client for large-scale data operations.
//!
//! ## Features
//!
//! - **Job lifecycle** - create, upload, process, poll, abort
//! - **Ingest** - Insert, Update, Upsert, Delete, Hard Delete
//! - **Query jobs** - create, inspect, list and abort
//! - **Results** - successful, failed and unprocessed records as raw CSV
//! - **Single upload** - a second upload for a job is rejected locally
//! - **Bounded polling** - stops on any terminal state, with optional
//!   attempt and deadline bounds and cooperative cancellation
//!
//! ## Example - Bulk Insert
//!
//! ```rust,ignore
//! use sfkit_bulk::{BulkApiClient, BulkRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfkit_bulk::Error> {
//!     let client = BulkApiClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token",
//!     )?;
//!
//!     let csv_data = "Name,Industry\nAcme Corp,Technology\nGlobal Inc,Finance\n";
//!     let result = client
//!         .execute_ingest(&BulkRequest::insert("Account"), csv_data)
//!         .await?;
//!
//!     println!(
//!         "{}: {} processed, {} failed",
//!         result.job.state,
//!         result.job.number_records_processed,
//!         result.job.number_records_failed
//!     );
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::BulkApiClient;
pub use error::{Error, ErrorKind, Result};
pub use types::*;
