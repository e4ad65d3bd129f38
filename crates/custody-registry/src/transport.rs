use std::fmt;

use alloy_primitives::B256;
use async_trait::async_trait;
use custody_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;

/// Hash identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(B256);

impl TxHash {
    pub fn new(hash: B256) -> Self {
        Self(hash)
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Outcome of a transaction once the chain included it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxInclusion {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `false` means the transaction was included but reverted.
    pub success: bool,
}

/// Transport to a chain node.
///
/// `send` returns as soon as the network accepts the transaction; inclusion
/// is a separate wait. Reads are point-in-time and never cached.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    async fn call(&self, to: Address, data: Vec<u8>) -> RegistryResult<Vec<u8>>;
    async fn send(&self, from: Address, to: Address, data: Vec<u8>) -> RegistryResult<TxHash>;
    async fn wait_for_inclusion(&self, tx: TxHash) -> RegistryResult<TxInclusion>;
}
