//! # sfkit-rest
//!
//! Salesforce REST API object describe.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfkit_rest::SalesforceRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfkit_rest::Error> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let opportunity = client.describe_opportunity().await?;
//!     for field in opportunity.fields.iter().filter(|f| f.createable) {
//!         println!("{}: {}", field.name, field.label);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod describe;
mod error;

pub use client::SalesforceRestClient;

// Describe types
pub use describe::{
    DescribeSObjectResult, FieldDescribe, PicklistValue, RecordTypeInfo, RecordTypeUrls,
    ScopeInfo,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Re-export sfkit-client types that users might need
pub use sfkit_client::{ClientConfig, ClientConfigBuilder};
