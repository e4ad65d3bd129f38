use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("auth challenge failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("storage service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
