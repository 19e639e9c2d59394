use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// User-input error in the structured filter; nothing was retrieved.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Both core signals were unavailable. Distinct from an empty success,
    /// which means retrieval ran and nothing matched.
    #[error("Retrieval unavailable (lexical: {lexical}; dense: {dense})")]
    RetrievalUnavailable { lexical: String, dense: String },

    #[error("{capability} timed out after {after:?}")]
    Timeout { capability: &'static str, after: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;
