use thiserror::Error;

pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
