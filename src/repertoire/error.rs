use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepertoireError {
    #[error("Opening not found: {0}")]
    OpeningNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage quota: {0}")]
    Quota(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, RepertoireError>;
