//! OAuth 2.0 username-password flow.

use serde::{Deserialize, Serialize};
use sfkit_client::ClientConfig;
use tracing::{debug, instrument};

use crate::credentials::PasswordCredentials;
use crate::error::{Error, ErrorKind, Result};

/// OAuth client for the token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Create an OAuth client on top of an existing HTTP client.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Create an OAuth client bounded by the same timeouts and user agent as
    /// the API transport built from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self::new(http_client))
    }

    /// Exchange username and password for an access token.
    ///
    /// Credentials are skipped in the tracing span.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn password_grant(&self, credentials: &PasswordCredentials) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "password"),
            ("username", credentials.username()),
            ("password", credentials.password()),
            ("client_id", credentials.client_id()),
            ("client_secret", credentials.client_secret()),
        ];
        let body = serde_urlencoded::to_string(params)?;

        let response = self
            .http_client
            .post(credentials.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        self.handle_token_response(response).await
    }

    /// Handle a token response, checking for errors.
    async fn handle_token_response(&self, response: reqwest::Response) -> Result<TokenResponse> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Token endpoint rejected the request");
            return Err(match serde_json::from_slice::<OAuthErrorResponse>(&body) {
                Ok(error) => Error::new(ErrorKind::OAuth {
                    error: error.error,
                    description: error.error_description,
                }),
                Err(_) => Error::new(ErrorKind::Http(format!(
                    "token endpoint returned status {}",
                    status.as_u16()
                ))),
            });
        }

        let token: TokenResponse = serde_json::from_slice(&body)?;
        Ok(token)
    }
}

/// Token response from OAuth.
///
/// `access_token` and `signature` are redacted in Debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Instance URL.
    pub instance_url: String,
    /// Identity URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at, in epoch milliseconds as a string.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}
