use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content identifier returned by the storage network for an upload.
///
/// The network assigns CIDs; this type never computes one. It only
/// guarantees the identifier is non-empty, because an empty CID would make
/// the submission record unresolvable.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Wrap a CID string, rejecting empty or whitespace-only input.
    pub fn new(cid: impl Into<String>) -> Result<Self, TypeError> {
        let cid = cid.into();
        if cid.trim().is_empty() {
            return Err(TypeError::EmptyCid);
        }
        Ok(Self(cid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form for human-facing output. Short CIDs pass through.
    pub fn preview(&self) -> String {
        if self.0.len() <= 12 {
            self.0.clone()
        } else {
            format!("{}...", &self.0[..12])
        }
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.0)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}
