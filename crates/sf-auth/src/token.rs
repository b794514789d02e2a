//! Cached access tokens with single-flight refresh.
//!
//! The current token is an immutable [`Token`] behind an `Arc`, swapped
//! wholesale on refresh. Readers take a cheap snapshot; a refresh happens
//! under an async mutex and waiters re-check the cache once they get the
//! lock, so a burst of callers on an empty or stale cache causes exactly one
//! password-grant exchange.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::BoxFuture;
use sfkit_client::{ClientConfig, SalesforceClient, TokenSource};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::credentials::PasswordCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, TokenResponse};

/// Platform default session lifetime.
const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(7200);

/// Tokens are refreshed this long before their computed expiry.
const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// An access token and the metadata returned with it.
#[derive(Clone)]
pub struct Token {
    /// Bearer token.
    pub access_token: String,
    /// Instance the org lives on.
    pub instance_url: String,
    /// Token type, normally "Bearer".
    pub token_type: Option<String>,
    /// Identity URL.
    pub id: Option<String>,
    /// Issue time reported by the platform.
    pub issued_at: Option<DateTime<Utc>>,
    /// Platform signature over id and issued_at.
    pub signature: Option<String>,
    /// Locally computed expiry.
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("token_type", &self.token_type)
            .field("id", &self.id)
            .field("issued_at", &self.issued_at)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Token {
    fn from_response(response: TokenResponse, lifetime: Duration) -> Self {
        let issued_at = response
            .issued_at
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        Self {
            access_token: response.access_token,
            instance_url: response.instance_url,
            token_type: response.token_type,
            id: response.id,
            issued_at,
            signature: response.signature,
            expires_at: Utc::now() + time_delta(lifetime),
        }
    }

    /// True while the token is more than `buffer` away from expiry.
    pub fn is_fresh(&self, buffer: Duration) -> bool {
        Utc::now() + time_delta(buffer) < self.expires_at
    }
}

fn time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::zero())
}

/// Acquires and caches access tokens through the OAuth password grant.
pub struct TokenManager {
    credentials: PasswordCredentials,
    oauth: OAuthClient,
    current: RwLock<Option<Arc<Token>>>,
    refresh: tokio::sync::Mutex<()>,
    session_lifetime: Duration,
    refresh_buffer: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("session_lifetime", &self.session_lifetime)
            .field("refresh_buffer", &self.refresh_buffer)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager whose exchanges use the default client timeouts.
    pub fn new(credentials: PasswordCredentials) -> Result<Self> {
        Self::with_config(credentials, &ClientConfig::default())
    }

    /// Create a manager whose exchanges use the timeouts and user agent of
    /// `config`.
    pub fn with_config(credentials: PasswordCredentials, config: &ClientConfig) -> Result<Self> {
        let oauth = OAuthClient::from_config(config)?;
        Ok(Self::with_oauth_client(credentials, oauth))
    }

    /// Create a manager that exchanges through `oauth`.
    pub fn with_oauth_client(credentials: PasswordCredentials, oauth: OAuthClient) -> Self {
        Self {
            credentials,
            oauth,
            current: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
        }
    }

    /// Set how long a token is assumed to live after it is issued.
    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Set how early before expiry a token is replaced.
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    /// The credentials this manager exchanges.
    pub fn credentials(&self) -> &PasswordCredentials {
        &self.credentials
    }

    /// The cached token, fresh or not, without touching the network.
    pub fn current(&self) -> Option<Arc<Token>> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    /// Drop the cached token so the next [`Self::token`] exchanges again.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.current.write() {
            *guard = None;
        }
    }

    /// Drop the cached token only if it is still `rejected`.
    ///
    /// A 401 for a token that has already been replaced leaves the newer
    /// token in place.
    pub fn invalidate_if_current(&self, rejected: &str) {
        if let Ok(mut guard) = self.current.write() {
            if guard
                .as_ref()
                .is_some_and(|token| token.access_token == rejected)
            {
                *guard = None;
            }
        }
    }

    /// Return the cached token while fresh, otherwise refresh it once for all
    /// concurrent callers.
    pub async fn token(&self) -> Result<Arc<Token>> {
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        let _refreshing = self.refresh.lock().await;
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        self.acquire_token().await
    }

    /// Like [`Self::token`], abandoning the wait or exchange when `cancel` fires.
    pub async fn token_with_cancel(&self, cancel: &CancellationToken) -> Result<Arc<Token>> {
        tokio::select! {
            token = self.token() => token,
            _ = cancel.cancelled() => Err(Error::new(ErrorKind::Cancelled)),
        }
    }

    /// Perform a password-grant exchange unconditionally and store the result.
    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    pub async fn acquire_token(&self) -> Result<Arc<Token>> {
        let response = self.oauth.password_grant(&self.credentials).await?;
        let token = Arc::new(Token::from_response(response, self.session_lifetime));

        info!(
            instance_url = %token.instance_url,
            expires_at = %token.expires_at,
            "Acquired access token"
        );

        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::new(ErrorKind::Config("token cache poisoned".to_string())))?;
        *guard = Some(token.clone());
        Ok(token)
    }

    fn fresh(&self) -> Option<Arc<Token>> {
        self.current()
            .filter(|token| token.is_fresh(self.refresh_buffer))
    }

    /// Build a client on `base_url` that authenticates through this manager.
    pub fn client(
        self: &Arc<Self>,
        base_url: &str,
        config: ClientConfig,
    ) -> Result<SalesforceClient> {
        let source: Arc<dyn TokenSource> = self.clone();
        Ok(SalesforceClient::with_token_source(base_url, source, config)?)
    }
}

impl TokenSource for TokenManager {
    fn access_token(&self) -> BoxFuture<'_, sfkit_client::Result<String>> {
        Box::pin(async move {
            let token = self.token().await?;
            Ok(token.access_token.clone())
        })
    }

    fn invalidate(&self, rejected: &str) {
        self.invalidate_if_current(rejected);
    }
}

/// Authenticate once and return a client on the credentials' base URL.
///
/// The first exchange happens here, so bad credentials fail before any API
/// call is made.
/// The token exchange is bounded by the timeouts in `config`, like every
/// API call made through the returned client.
pub async fn connect(
    credentials: PasswordCredentials,
    config: ClientConfig,
) -> Result<SalesforceClient> {
    let base_url = credentials.base_url().to_string();
    let manager = Arc::new(TokenManager::with_config(credentials, &config)?);
    manager.acquire_token().await?;
    manager.client(&base_url, config)
}

/// Authenticate once and return a client on the instance URL reported by the
/// token endpoint.
pub async fn connect_to_instance(
    credentials: PasswordCredentials,
    config: ClientConfig,
) -> Result<SalesforceClient> {
    let manager = Arc::new(TokenManager::with_config(credentials, &config)?);
    let token = manager.acquire_token().await?;
    manager.client(&token.instance_url, config)
}
