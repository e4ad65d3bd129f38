use custody_registry::RegistryError;
use custody_storage::StorageError;
use custody_types::{Cid, EvidenceDigest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("could not read evidence payload: {0}")]
    Read(#[from] std::io::Error),

    #[error("evidence upload failed: {0}")]
    Upload(#[from] StorageError),

    /// The payload is already stored under `cid`; only the chain step
    /// failed. Callers can resubmit without re-uploading.
    #[error("chain submission failed for {cid} (digest {digest}): {source}")]
    Chain {
        cid: Cid,
        digest: EvidenceDigest,
        #[source]
        source: RegistryError,
    },
}

pub type SubmitResult<T> = Result<T, SubmitError>;
