use crate::validate::ValidationError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RulzError {
    #[error("Rule not found: {0}")]
    RuleNotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Scope name is reserved: {0}")]
    ReservedScopeName(String),

    #[error("Rule limit reached for scope '{scope}' (max {max})")]
    ScopeLimitReached { scope: String, max: usize },

    #[error("No usable rule storage: {0}")]
    StorageUnavailable(String),

    #[error("Remote connection failed after {attempts} attempt(s): {last}")]
    ConnectionExhausted { attempts: u32, last: String },

    #[error("Failed to persist rules: {0}")]
    Persistence(String),

    #[error("Remote request failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, RulzError>;
