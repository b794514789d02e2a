//! Error types for sfkit-bulk.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// The transport error behind a [`ErrorKind::Client`] error, if any.
    pub fn client_error(&self) -> Option<&sfkit_client::Error> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<sfkit_client::Error>())
    }

    /// True if the operation stopped because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid job state: {0}")]
    InvalidState(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<sfkit_client::Error> for Error {
    fn from(err: sfkit_client::Error) -> Self {
        let kind = if err.is_cancelled() {
            ErrorKind::Cancelled
        } else {
            ErrorKind::Client(err.to_string())
        };
        Error { kind, source: Some(Box::new(err)) }
    }
}

impl From<sfkit_auth::Error> for Error {
    fn from(err: sfkit_auth::Error) -> Self {
        Error { kind: ErrorKind::Auth(err.to_string()), source: Some(Box::new(err)) }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error { kind: ErrorKind::Csv(err.to_string()), source: Some(Box::new(err)) }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error { kind: ErrorKind::Io(err.to_string()), source: Some(Box::new(err)) }
    }
}
