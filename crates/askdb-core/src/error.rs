//! Unified Error Model
use thiserror::Error;

/// Failures reported by a [`crate::SqlDatabase`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// Unreachable target, rejected credentials or a dropped connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The driver's message, verbatim.
    #[error("{0}")]
    QueryExecution(String),
}

/// Any failure talking to the language model provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("model error: {0}")]
pub struct ModelError(pub String);

impl ModelError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Pipeline-level failure surfaced to the front ends.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// SQL execution failed; carries the driver message verbatim.
    #[error("{0}")]
    ExecutionFailure(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("database {0}")]
    Connection(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Whether the caller's question produced the failure (HTTP 4xx) rather
    /// than the service or one of its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ExecutionFailure(_))
    }
}

impl From<DatabaseError> for PipelineError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::QueryExecution(msg) => Self::ExecutionFailure(msg),
            DatabaseError::Connection(msg) => Self::Connection(format!("connection failed: {msg}")),
        }
    }
}
