use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Connection to {endpoint} unavailable: {reason}")]
    ConnectionUnavailable { endpoint: String, reason: String },

    #[error("Command against {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("Protocol error from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, SentinelError>;

impl From<std::io::Error> for SentinelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
