//! Submission orchestration for the Custody system.
//!
//! A [`SubmissionDraft`] collects what the user wants to submit; the
//! [`SubmissionOrchestrator`] turns one draft into a digest, a storage
//! upload, and a single on-chain record, in that order. Upload always
//! precedes the chain: a record without a CID does not exist.

pub mod draft;
pub mod error;
pub mod orchestrator;

pub use draft::{EvidencePayload, SubmissionDraft};
pub use error::{SubmitError, SubmitResult};
pub use orchestrator::{
    SubmissionOrchestrator, SubmissionOutcome, SubmissionState, UploadMode,
};
