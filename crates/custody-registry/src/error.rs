use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("chain transport error: {0}")]
    Transport(String),

    #[error("request rejected by signer: {0}")]
    Rejected(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transaction {tx} reverted")]
    Reverted { tx: String },

    #[error("abi decode error: {0}")]
    Decode(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
