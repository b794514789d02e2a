//! High-level Salesforce client with typed HTTP methods.
//!
//! `SalesforceClient` ties together the rate-limited transport, the API
//! version, the base URL and a [`TokenSource`]. Clones share the limiter and
//! the token source, so every request issued through any clone counts against
//! one global budget and uses one token.
//!
//! ## Security
//!
//! - Token sources are never printed by Debug output
//! - Request bodies are skipped in tracing spans

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::token::{StaticToken, TokenSource};
use crate::DEFAULT_API_VERSION;

/// High-level Salesforce API client.
///
/// # Example
///
/// ```rust,ignore
/// use sfkit_client::SalesforceClient;
///
/// let client = SalesforceClient::new("https://myorg.my.salesforce.com", token)?;
/// let limits: serde_json::Value = client.rest_get("limits").await?;
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    base_url: String,
    api_version: String,
    tokens: Arc<dyn TokenSource>,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("tokens", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Create a client for a pre-issued access token.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(base_url, access_token, ClientConfig::default())
    }

    /// Create a client for a pre-issued access token with custom configuration.
    pub fn with_config(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        Self::with_token_source(base_url, Arc::new(StaticToken::new(access_token)), config)
    }

    /// Create a client that asks `tokens` for a bearer token before each request.
    pub fn with_token_source(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        config: ClientConfig,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let http = SfHttpClient::new(config)?;
        Ok(Self {
            http,
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            tokens,
            cancel: None,
        })
    }

    /// Set the API version (e.g. "53.0"; a leading "v" is accepted).
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = version.trim_start_matches('v').to_string();
        self
    }

    /// Return a client whose every request observes `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The cancellation token attached with [`Self::with_cancellation`].
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the underlying transport.
    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    /// Get the shared token source.
    pub fn token_source(&self) -> &Arc<dyn TokenSource> {
        &self.tokens
    }

    /// Build the full URL for a path.
    ///
    /// Absolute URLs pass through untouched; anything else is joined to the
    /// base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Build the REST API URL for a path.
    ///
    /// Example: `rest_url("sobjects/Account")` -> `{base}/services/data/v53.0/sobjects/Account`
    pub fn rest_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}",
            self.base_url, self.api_version, path
        )
    }

    /// Build the Bulk API 2.0 URL for a path under `jobs/`.
    pub fn bulk_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/jobs/{}",
            self.base_url, self.api_version, path
        )
    }

    // =========================================================================
    // Base HTTP Methods
    // =========================================================================

    /// Create a GET request builder.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(url)
    }

    /// Authenticate and execute a request, returning the buffered response.
    ///
    /// A 401 from the platform invalidates the token source so the next call
    /// acquires a fresh token; the 401 itself is returned to the caller.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let cancel = request.cancel.clone().or_else(|| self.cancel.clone());

        let token = match &cancel {
            Some(cancel) => {
                tokio::select! {
                    token = self.tokens.access_token() => token?,
                    _ = cancel.cancelled() => return Err(Error::cancelled()),
                }
            }
            None => self.tokens.access_token().await?,
        };

        let mut request = request.bearer_auth(token.as_str());
        if let Some(cancel) = cancel {
            request = request.cancel_on(cancel);
        }

        match self.http.execute(request).await {
            Err(err) if err.is_unauthorized() => {
                warn!("Access token rejected, invalidating cached token");
                self.tokens.invalidate(&token);
                Err(err)
            }
            result => result,
        }
    }

    // =========================================================================
    // Typed JSON Methods
    // =========================================================================

    /// Execute a request and decode its JSON body, or `None` for 201/204.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        let response = self.execute(request).await?;
        response.json_opt()
    }

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = self.get(&self.url(url));
        require_body(self.send_json(request).await?)
    }

    /// GET request to REST API with JSON response.
    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json(&self.rest_url(path)).await
    }

    /// GET request returning the raw body as text, with the given Accept header.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str, accept: &str) -> Result<String> {
        let request = self.get(&self.url(url)).header("Accept", accept);
        self.execute(request).await?.text()
    }

    /// POST request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.post(&self.url(url)).json(body)?;
        require_body(self.send_json(request).await?)
    }

    /// PATCH request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.patch(&self.url(url)).json(body)?;
        require_body(self.send_json(request).await?)
    }

    /// PATCH request with JSON body whose response body is ignored.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn patch_no_content<B: Serialize>(&self, url: &str, body: &B) -> Result<()> {
        let request = self.patch(&self.url(url)).json(body)?;
        self.execute(request).await?;
        Ok(())
    }
}

fn require_body<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| Error::new(ErrorKind::Decode("no content".to_string())))
}

/// Validate a base URL and strip trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::Config("base URL is empty".to_string())));
    }

    let parsed = url::Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::new(ErrorKind::Config(format!(
            "base URL must use http or https, got {}",
            parsed.scheme()
        ))));
    }

    Ok(trimmed.to_string())
}
