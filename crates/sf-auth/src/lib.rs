//! # sfkit-auth
//!
//! OAuth 2.0 username-password authentication for Salesforce.
//!
//! ## Security
//!
//! - Passwords, client secrets and access tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Transport error messages that mention credentials are sanitized
//!
//! ## Token lifecycle
//!
//! [`TokenManager`] caches the current [`Token`] and refreshes it shortly
//! before the computed expiry. Concurrent callers that find the cache stale
//! share a single exchange. It implements [`sfkit_client::TokenSource`], so a
//! [`sfkit_client::SalesforceClient`] built on it invalidates the cache when
//! the API answers 401.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfkit_auth::{connect, PasswordCredentials};
//! use sfkit_client::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfkit_auth::Error> {
//!     let creds = PasswordCredentials::from_env()?;
//!     let client = connect(creds, ClientConfig::default()).await?;
//!     println!("connected to {}", client.base_url());
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod oauth;
mod token;

pub use credentials::PasswordCredentials;
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, TokenResponse};
pub use token::{connect, connect_to_instance, Token, TokenManager};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
