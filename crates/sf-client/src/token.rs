//! The seam between the transport and whatever issues access tokens.

use futures::future::BoxFuture;

use crate::error::Result;

/// Supplies bearer tokens to [`crate::SalesforceClient`].
///
/// Implementations are shared by every clone of a client, so they must be
/// safe to call concurrently.
pub trait TokenSource: Send + Sync {
    /// Return an access token, acquiring one if necessary.
    fn access_token(&self) -> BoxFuture<'_, Result<String>>;

    /// Forget the cached token if it is still `rejected`. Called after the
    /// platform answers 401 to a request sent with `rejected`.
    fn invalidate(&self, _rejected: &str) {}
}

/// A pre-issued access token that never changes.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap an existing access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"[REDACTED]").finish()
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> BoxFuture<'_, Result<String>> {
        let token = self.0.clone();
        Box::pin(async move { Ok(token) })
    }
}
