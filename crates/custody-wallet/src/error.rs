use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no wallet provider is available")]
    NoProvider,

    #[error("no active wallet session")]
    NotConnected,

    #[error("provider authorized no accounts")]
    NoAccounts,

    #[error("wallet request rejected: {0}")]
    Rejected(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("marker I/O error: {0}")]
    Marker(#[from] std::io::Error),
}

pub type WalletResult<T> = Result<T, WalletError>;
