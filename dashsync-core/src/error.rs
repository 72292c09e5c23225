use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("base url cannot carry api paths or credentials: {0}")]
    InvalidBaseUrl(String),
    #[error("api returned {status}: {body}")]
    Server { status: StatusCode, body: String },
    /// The server refused a write because its version moved past ours (HTTP 412).
    #[error("{status}: {message}")]
    Conflict { status: String, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict { .. })
    }
}
