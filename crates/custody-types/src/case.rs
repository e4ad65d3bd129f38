use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Numeric identifier of a case in the registry contract.
///
/// Case ids are caller-chosen, non-zero integers. Id zero is reserved: the
/// contract's `cases` mapping returns a zeroed record for any id it has
/// never seen, so zero can never name a real case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(u64);

impl CaseId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse a user-supplied case id string. Empty, non-numeric, and zero
    /// inputs are rejected.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidCaseId(s.to_string()));
        }
        let id: u64 = trimmed
            .parse()
            .map_err(|_| TypeError::InvalidCaseId(s.to_string()))?;
        if id == 0 {
            return Err(TypeError::ZeroCaseId);
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id as a 256-bit word, the form the contract takes it in.
    pub fn to_u256(&self) -> U256 {
        U256::from(self.0)
    }
}

impl fmt::Debug for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaseId({})", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CaseId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A case row as stored by the registry contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: CaseId,
    /// Digest of the off-chain case metadata document.
    pub metadata_hash: String,
    pub creator: Address,
    /// Creation time in seconds since the epoch, as reported by the chain.
    pub created_at: u64,
    pub is_open: bool,
}

impl CaseRecord {
    /// Whether this is the zeroed row the contract returns for an id it has
    /// never seen.
    pub fn is_sentinel(&self) -> bool {
        self.id.value() == 0
            && self.metadata_hash.is_empty()
            && self.creator == Address::ZERO
            && self.created_at == 0
            && !self.is_open
    }
}
