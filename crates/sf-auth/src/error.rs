//! Error types for sfkit-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sfkit-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfkit-auth operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// OAuth error response from the token endpoint.
    #[error("OAuth error: {error} - {description}")]
    OAuth { error: String, description: String },

    /// A required credential is missing or malformed.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The token endpoint returned a body that is not a token.
    #[error("JSON error: {0}")]
    Json(String),

    /// Form encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The exchange was cancelled by the caller.
    #[error("Token acquisition cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // The form body carries the password; keep it out of messages.
        let message = err.to_string();
        let sanitized = if message.contains("password") || message.contains("token=") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(
            ErrorKind::InvalidCredentials(format!("base URL: {}", err)),
            err,
        )
    }
}

impl From<sfkit_client::Error> for Error {
    fn from(err: sfkit_client::Error) -> Self {
        Error::with_source(ErrorKind::Config(err.to_string()), err)
    }
}

/// Token failures reach the transport as authentication errors, except
/// cancellation which keeps its own kind.
impl From<Error> for sfkit_client::Error {
    fn from(err: Error) -> Self {
        let kind = match &err.kind {
            ErrorKind::Cancelled => sfkit_client::ErrorKind::Cancelled,
            other => sfkit_client::ErrorKind::Authentication(other.to_string()),
        };
        sfkit_client::Error::with_source(kind, err)
    }
}
