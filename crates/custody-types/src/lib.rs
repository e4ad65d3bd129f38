//! Foundation types for the Custody evidence registry client.
//!
//! This crate provides the identity and record types shared by every other
//! custody crate.
//!
//! # Key Types
//!
//! - [`EvidenceDigest`] — SHA-256 digest of an evidence payload
//! - [`Cid`] — Content identifier assigned by the storage network
//! - [`CaseId`] — Non-zero numeric case identifier
//! - [`RoleId`] — Access-control role (keccak-256 of the role name)
//! - [`SubmissionRecord`] — An upload-acknowledged evidence submission
//! - [`CaseRecord`] — A case row as stored by the registry contract

pub mod case;
pub mod cid;
pub mod digest;
pub mod error;
pub mod record;
pub mod role;

pub use alloy_primitives::Address;
pub use case::{CaseId, CaseRecord};
pub use cid::Cid;
pub use digest::EvidenceDigest;
pub use error::TypeError;
pub use record::{SubmissionRecord, SubmitterType};
pub use role::RoleId;
