use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl From<reqwest::Error> for MenuError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MenuError::Upstream(format!("request timed out: {}", err))
        } else {
            MenuError::Upstream(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
