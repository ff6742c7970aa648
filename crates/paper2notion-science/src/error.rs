use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered HTTP {status}: {body}")]
    ApiStatus { url: String, status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),
}

pub type Result<T> = std::result::Result<T, ScienceError>;
