//! Rate-limited HTTP transport.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::rate_limit::RateLimiter;
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::translate::translate;

/// API usage percentage above which responses are logged as a warning.
const API_USAGE_WARN_PERCENT: f64 = 80.0;

/// HTTP client for Salesforce APIs.
///
/// Every request passes one shared token bucket before it is sent. Clones
/// share the bucket and the connection pool.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    limiter: Option<Arc<RateLimiter>>,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        let limiter = config
            .rate_limit
            .map(RateLimiter::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            inner,
            limiter,
            config,
        })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared limiter, if admission control is enabled.
    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Execute a request.
    ///
    /// Sets `Accept: application/json` and, unless the request names one,
    /// `Content-Type: application/json`; waits for the limiter; sends; and
    /// buffers the body. A 2xx status is returned as-is. Anything else is
    /// translated into an API error. Cancellation is honored during the
    /// limiter wait and the round trip.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = request
            .default_header("Accept", "application/json")
            .default_header("Content-Type", "application/json");
        let cancel = request.cancel.clone();

        if let Some(limiter) = &self.limiter {
            limiter.acquire(cancel.as_ref()).await?;
        }

        match cancel {
            Some(token) => {
                tokio::select! {
                    result = self.execute_once(&request) => result,
                    _ = token.cancelled() => Err(Error::cancelled()),
                }
            }
            None => self.execute_once(&request).await,
        }
    }

    /// Send a single request and buffer its body.
    async fn execute_once(&self, request: &RequestBuilder) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.body(serde_json::to_vec(value)?),
                RequestBody::Bytes(bytes) => req.body(bytes.clone()),
            };
        }

        if self.config.enable_tracing {
            debug!(method = ?request.method, url = %request.url, "Sending request");
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response = Response::new(status, headers, body);

        if self.config.enable_tracing {
            let content_length = response.body().len();
            if response.is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }

            if let Some(usage) = response.api_usage() {
                if usage.is_above_threshold(API_USAGE_WARN_PERCENT) {
                    warn!(
                        used = usage.used,
                        limit = usage.limit,
                        "API usage above {}% of the org limit",
                        API_USAGE_WARN_PERCENT
                    );
                }
            }
        }

        if response.is_success() {
            Ok(response)
        } else {
            Err(translate(status, response.body()))
        }
    }

    /// Execute a request under the given cancellation token.
    pub async fn execute_with_cancel(
        &self,
        request: RequestBuilder,
        cancel: CancellationToken,
    ) -> Result<Response> {
        self.execute(request.cancel_on(cancel)).await
    }
}
