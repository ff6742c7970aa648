use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} answered HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response missing {field}")]
    MalformedResponse {
        service: &'static str,
        field: &'static str,
    },

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

pub type Result<T> = std::result::Result<T, PublishError>;
