use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("parse: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("task service rejected the token (HTTP {0})")]
    Unauthorized(u16),
    #[error("task service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("task service request failed: {0}")]
    Request(String),
    #[error("task service response could not be decoded: {0}")]
    Decode(String),
    #[error("failed to close {} task(s): {}", .0.len(), .0.join(", "))]
    Close(Vec<String>),
}

#[derive(Debug, Error)]
#[error("document: {0}")]
pub struct DocumentError(pub String);

impl DocumentError {
    pub fn missing_block(uid: &str) -> Self {
        DocumentError(format!("block {uid} not found"))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Request(err.to_string())
        }
    }
}
