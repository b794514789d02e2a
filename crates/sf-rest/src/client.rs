//! Salesforce REST API client.
//!
//! This client wraps `SalesforceClient` from `sfkit-client` and provides
//! typed describe operations.

use sfkit_client::security::names;
use sfkit_client::{ClientConfig, SalesforceClient};
use tracing::instrument;

use crate::describe::DescribeSObjectResult;
use crate::error::{Error, ErrorKind, Result};

/// Salesforce REST API client.
///
/// # Example
///
/// ```rust,ignore
/// use sfkit_rest::SalesforceRestClient;
///
/// let client = SalesforceRestClient::new(
///     "https://myorg.my.salesforce.com",
///     "access_token_here",
/// )?;
///
/// let account = client.describe_account().await?;
/// for field in &account.fields {
///     println!("{} ({})", field.name, field.field_type);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: SalesforceClient,
}

impl SalesforceRestClient {
    /// Create a new REST client with the given base URL and access token.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(base_url, access_token)?;
        Ok(Self { client })
    }

    /// Create a new REST client with custom HTTP configuration.
    pub fn with_config(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(base_url, access_token, config)?;
        Ok(Self { client })
    }

    /// Create a REST client from an existing SalesforceClient.
    ///
    /// The limiter and token source are shared with every other user of
    /// `client`.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
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

    // =========================================================================
    // Describe Operations
    // =========================================================================

    /// Get metadata for a specific SObject.
    ///
    /// This is equivalent to calling `/services/data/vXX.0/sobjects/{sobject}/describe`.
    /// The name is checked before any request is made.
    #[instrument(skip(self))]
    pub async fn describe_sobject(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        if !names::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::InvalidSObject(sobject.to_string())));
        }
        let path = format!("sobjects/{}/describe", sobject);
        Ok(self.client.rest_get(&path).await?)
    }

    /// Describe the Account object.
    pub async fn describe_account(&self) -> Result<DescribeSObjectResult> {
        self.describe_sobject("Account").await
    }

    /// Describe the Contact object.
    pub async fn describe_contact(&self) -> Result<DescribeSObjectResult> {
        self.describe_sobject("Contact").await
    }

    /// Describe the Opportunity object.
    pub async fn describe_opportunity(&self) -> Result<DescribeSObjectResult> {
        self.describe_sobject("Opportunity").await
    }

    /// Describe the User object.
    pub async fn describe_user(&self) -> Result<DescribeSObjectResult> {
        self.describe_sobject("User").await
    }
}
