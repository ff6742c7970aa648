use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },

    #[error("model returned no text (finish reason: {0})")]
    EmptyResponse(String),

    #[error("document is {size} bytes, inline limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, LlmError>;
