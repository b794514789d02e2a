//! # sfkit
//!
//! A Salesforce REST and Bulk API 2.0 client for Rust.
//!
//! Every request made through one client shares a single token-bucket rate
//! limiter and a single cached OAuth token; non-2xx responses come back as a
//! typed error carrying the platform's own error code and message.
//!
//! ## Security
//!
//! - Sensitive data (tokens, passwords, secrets) are redacted in Debug output
//! - Tracing spans skip credential parameters and request bodies
//! - Platform error messages are sanitized before they are stored
//!
//! ## Crates
//!
//! - **sfkit-client** - Rate-limited transport, error translation, cancellation
//! - **sfkit-auth** - OAuth 2.0 password grant with cached, single-flight refresh
//! - **sfkit-rest** - Object describe
//! - **sfkit-bulk** - Bulk API 2.0 job lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfkit::{BulkApiClient, BulkRequest, ClientConfig, SalesforceRestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sfkit::init_tracing();
//!
//!     // SF_BASE_URL, SF_USERNAME, SF_PASSWORD, SF_CLIENT_ID, SF_CLIENT_SECRET
//!     let client = sfkit::connect_from_env(ClientConfig::default()).await?;
//!
//!     let rest = SalesforceRestClient::from_client(client.clone());
//!     let account = rest.describe_account().await?;
//!     println!("Account has {} fields", account.fields.len());
//!
//!     let bulk = BulkApiClient::from_client(client);
//!     let result = bulk
//!         .execute_ingest(&BulkRequest::insert("Account"), "Name\nAcme Inc\n")
//!         .await?;
//!     println!("{}", result.job.state);
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "auth")]
pub use sfkit_auth as auth;
#[cfg(feature = "bulk")]
pub use sfkit_bulk as bulk;
#[cfg(feature = "client")]
pub use sfkit_client as client;
#[cfg(feature = "rest")]
pub use sfkit_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use sfkit_auth::{PasswordCredentials, TokenManager};
#[cfg(feature = "bulk")]
pub use sfkit_bulk::{BulkApiClient, BulkOperation, BulkRequest, JobState, JobType, PollOptions};
#[cfg(feature = "client")]
pub use sfkit_client::{CancellationToken, ClientConfig, RateLimitConfig, SalesforceClient};
#[cfg(feature = "rest")]
pub use sfkit_rest::SalesforceRestClient;

use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "sfkit=info,sfkit_client=info,sfkit_auth=info,sfkit_bulk=info,sfkit_rest=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Load password-grant credentials from the environment, authenticate once
/// and return a client that keeps its token fresh.
///
/// See [`PasswordCredentials::from_env`] for the variables read.
#[cfg(feature = "auth")]
pub async fn connect_from_env(config: ClientConfig) -> sfkit_auth::Result<SalesforceClient> {
    let credentials = PasswordCredentials::from_env()?;
    sfkit_auth::connect(credentials, config).await
}
