use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("condition check failed")]
    ConditionFailed,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("seed file {path}: {reason}")]
    Seed { path: String, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
