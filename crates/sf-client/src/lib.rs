//! # sfkit-client
//!
//! Core HTTP client infrastructure for Salesforce APIs.
//!
//! This crate provides the request pipeline shared by the REST and Bulk
//! crates:
//! - Token-bucket admission control shared across clones of a client
//! - Uniform request decoration (bearer token, JSON content negotiation)
//! - Single-read response buffering
//! - Translation of non-2xx statuses into a typed error taxonomy
//! - Cancellation of the limiter wait, token acquisition and round trip
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │                 (sfkit-rest, sfkit-bulk)                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Base URL, API version, shared TokenSource                │
//! │  - Typed JSON methods (get_json, post_json, ...)            │
//! │  - Invalidates the token source on 401                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Rate limiter, headers, send, buffer                      │
//! │  - translate() for anything outside 2xx                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfkit_client::{ClientConfig, SalesforceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfkit_client::Error> {
//!     let client = SalesforceClient::with_config(
//!         "https://myorg.my.salesforce.com",
//!         access_token,
//!         ClientConfig::default(),
//!     )?;
//!
//!     let limits: serde_json::Value = client.rest_get("limits").await?;
//!     println!("{limits:#}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod rate_limit;
mod request;
mod response;
mod salesforce_client;
pub mod security;
mod token;
mod translate;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, ApiErrorKind, Error, ErrorKind, Result};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{ApiUsage, Response};
pub use salesforce_client::SalesforceClient;
pub use token::{StaticToken, TokenSource};
pub use translate::translate;

pub use tokio_util::sync::CancellationToken;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "53.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sfkit/", env!("CARGO_PKG_VERSION"));
