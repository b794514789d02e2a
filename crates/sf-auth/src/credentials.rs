//! Password-grant credentials.
//!
//! Secrets are redacted in Debug output.

use crate::error::{Error, ErrorKind, Result};

/// Everything the OAuth password grant needs.
///
/// Construction validates that every field is present, so a value of this
/// type is always usable for an exchange.
#[derive(Clone)]
pub struct PasswordCredentials {
    base_url: String,
    username: String,
    password: String,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl PasswordCredentials {
    /// Validate and bundle password-grant credentials.
    ///
    /// Every field must be non-empty and `base_url` must be an absolute
    /// http(s) URL.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let creds = Self {
            base_url,
            username: username.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables (each with a `SALESFORCE_` fallback):
    /// - `SF_BASE_URL`
    /// - `SF_USERNAME`
    /// - `SF_PASSWORD`
    /// - `SF_CLIENT_ID`
    /// - `SF_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        Self::new(
            env_var("BASE_URL")?,
            env_var("USERNAME")?,
            env_var("PASSWORD")?,
            env_var("CLIENT_ID")?,
            env_var("CLIENT_SECRET")?,
        )
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("base URL", &self.base_url),
            ("username", &self.username),
            ("password", &self.password),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::new(ErrorKind::InvalidCredentials(format!(
                    "{} is required",
                    name
                ))));
            }
        }

        let parsed = url::Url::parse(&self.base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::new(ErrorKind::InvalidCredentials(format!(
                "base URL must use http or https, got {}",
                parsed.scheme()
            ))));
        }

        Ok(())
    }

    /// The login/base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The connected app's client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// The OAuth token endpoint for these credentials.
    pub fn token_url(&self) -> String {
        format!("{}/services/oauth2/token", self.base_url)
    }
}

/// Read `SF_{suffix}`, falling back to `SALESFORCE_{suffix}`.
fn env_var(suffix: &str) -> Result<String> {
    let primary = format!("SF_{}", suffix);
    std::env::var(&primary)
        .or_else(|_| std::env::var(format!("SALESFORCE_{}", suffix)))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::new(ErrorKind::EnvVar(primary)))
}
