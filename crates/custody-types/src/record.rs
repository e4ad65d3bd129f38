use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::case::CaseId;
use crate::cid::Cid;
use crate::digest::EvidenceDigest;
use crate::error::TypeError;

/// How the submitter chose to identify themselves on the record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SubmitterType {
    #[default]
    Anonymous = 0,
    Authenticated = 1,
}

impl SubmitterType {
    /// The wire discriminant the contract takes (`uint8`).
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self, TypeError> {
        match value {
            0 => Ok(Self::Anonymous),
            1 => Ok(Self::Authenticated),
            other => Err(TypeError::UnknownSubmitterType(other.to_string())),
        }
    }
}

impl fmt::Display for SubmitterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

impl FromStr for SubmitterType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "authenticated" => Ok(Self::Authenticated),
            other => Err(TypeError::UnknownSubmitterType(other.to_string())),
        }
    }
}

/// A fully-assembled evidence submission, ready for the registry contract.
///
/// Holding one of these means the storage network has already acknowledged
/// the payload: construction requires the CID, so a record can never exist
/// before its upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub case_id: CaseId,
    pub digest: EvidenceDigest,
    pub cid: Cid,
    pub submitter: SubmitterType,
    /// Opaque reference to the key material an authorized reader needs to
    /// decrypt the payload. Empty when the payload is not encrypted for a
    /// specific reader.
    pub key_ref: String,
}

impl SubmissionRecord {
    pub fn new(
        case_id: CaseId,
        digest: EvidenceDigest,
        cid: Cid,
        submitter: SubmitterType,
        key_ref: impl Into<String>,
    ) -> Self {
        Self {
            case_id,
            digest,
            cid,
            submitter,
            key_ref: key_ref.into(),
        }
    }
}
