use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("content identifier is empty")]
    EmptyCid,

    #[error("invalid case id: {0:?}")]
    InvalidCaseId(String),

    #[error("case id must be non-zero")]
    ZeroCaseId,

    #[error("unknown submitter type: {0:?}")]
    UnknownSubmitterType(String),
}
