//! Error types for sfkit-client.
//!
//! Every failure surfaced by the transport falls into one of four families:
//! transport failures (network, DNS, timeouts, request construction),
//! authentication failures (token acquisition), API failures (a non-2xx
//! status translated by [`crate::translate`]) and decode failures (a 2xx body
//! that was expected to be JSON but was not).

use std::fmt;

/// Result type alias for sfkit-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfkit-client operations.
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

    /// Shorthand for a cancellation error.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// The translated API error kind, if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match &self.kind {
            ErrorKind::Api(api) => Some(api.kind),
            _ => None,
        }
    }

    /// The HTTP status, if this is an API error.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Api(api) => Some(api.status),
            _ => None,
        }
    }

    /// Returns true if the platform rejected the bearer token (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::Unauthorized)
    }

    /// Returns true if the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if this error came from a failed token acquisition.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Network, DNS or request construction failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timeout")]
    Timeout,

    /// Access token could not be acquired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Non-2xx response from the platform.
    #[error("{0}")]
    Api(ApiError),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,
}

/// Status-derived classification of a platform error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 300: an upsert external id matched more than one record.
    MultipleExternalIdMatch,
    /// 304
    NotModified,
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 405
    MethodNotAllowed,
    /// 409
    Conflict,
    /// 500
    InternalError,
    /// Any other status outside 200..=299.
    Unknown,
}

impl ApiErrorKind {
    /// Map an HTTP status code onto the platform error taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            300 => ApiErrorKind::MultipleExternalIdMatch,
            304 => ApiErrorKind::NotModified,
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            405 => ApiErrorKind::MethodNotAllowed,
            409 => ApiErrorKind::Conflict,
            500 => ApiErrorKind::InternalError,
            _ => ApiErrorKind::Unknown,
        }
    }

    /// Base message for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::MultipleExternalIdMatch => "multiple matches for external id",
            ApiErrorKind::NotModified => "content not modified",
            ApiErrorKind::BadRequest => "bad request",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::MethodNotAllowed => "method not allowed",
            ApiErrorKind::Conflict => "conflict",
            ApiErrorKind::InternalError => "internal server error",
            ApiErrorKind::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A translated platform error: base kind plus optional enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Base kind selected from the status code.
    pub kind: ApiErrorKind,
    /// The raw HTTP status.
    pub status: u16,
    /// Platform error code of the first reported error (e.g. `INVALID_FIELD`).
    pub error_code: Option<String>,
    /// Platform message of the first reported error.
    pub message: Option<String>,
    /// Offending field names of the first reported error.
    pub fields: Vec<String>,
}

impl ApiError {
    /// An unenriched error for the given status.
    pub fn from_status(status: u16) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status,
            error_code: None,
            message: None,
            fields: Vec::new(),
        }
    }

    /// Returns true if platform detail was attached.
    pub fn is_enriched(&self) -> bool {
        self.message.is_some()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "salesforce: {}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {} {}", message, self.fields.join(","))?;
        }
        Ok(())
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::new(ErrorKind::Api(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_decode() {
            ErrorKind::Decode(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Decode(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("invalid URL: {}", err)), err)
    }
}
