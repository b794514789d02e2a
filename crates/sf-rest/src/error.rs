//! Error types for sfkit-rest.

/// Result type alias for sfkit-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfkit-rest operations.
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

    /// The transport error behind a [`ErrorKind::Client`] error, if any.
    ///
    /// Use this to reach the typed API error (status, error code, fields).
    pub fn client_error(&self) -> Option<&sfkit_client::Error> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<sfkit_client::Error>())
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The request failed in transport, authentication or at the API.
    #[error("Client error: {0}")]
    Client(String),

    /// The object name is not a valid API name.
    #[error("Invalid SObject name: {0:?}")]
    InvalidSObject(String),
}

impl From<sfkit_client::Error> for Error {
    fn from(err: sfkit_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
