use thiserror::Error;
use uuid::Uuid;

pub type DealTraceResult<T> = Result<T, DealTraceError>;

#[derive(Error, Debug)]
pub enum DealTraceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Pipeline store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Typed outcomes of the opportunity read path. The attribution core never
/// probes for schema availability; the store either returns data or one of
/// these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Opportunity {0} not found")]
    NotFound(Uuid),

    #[error("Pipeline store unavailable: {0}")]
    Unavailable(String),
}
