use thiserror::Error;

/// Failure below HTTP: the request never produced a status code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection interrupted: {0}")]
    Interrupted(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and dropped connections are worth retrying; anything else is
    /// a local problem that will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Failure of a call through the rate-limited retrying client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Every attempt hit a transient failure (timeout, connection, 429, 5xx).
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    /// The server refused the request with a non-retryable status.
    #[error("HTTP status {status} from {url}")]
    Rejected { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(TransportError),
}

#[derive(Debug, Error)]
pub enum ForumError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("forum API error (code {code}): {description}")]
    Api { code: i64, description: String },

    #[error("forum resource not found: {0}")]
    NotFound(String),

    #[error("invalid response from forum: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("invalid response from explorer: {0}")]
    Malformed(String),
}
