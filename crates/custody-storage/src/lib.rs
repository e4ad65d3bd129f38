//! Storage-network client for the Custody system.
//!
//! Evidence payloads go to a content-addressed storage network before
//! anything touches the chain. [`EvidenceUploader`] is the seam:
//! [`StorageClient`] talks to the real network over HTTP (signed auth
//! challenge, encrypted and plain uploads, gateway retrieval), and
//! [`InMemoryUploader`] backs tests. Upload progress is reported
//! best-effort through [`ProgressObserver`].

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod progress;
pub mod uploader;

pub use client::{FetchedEvidence, StorageClient};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryUploader, StoredUpload};
pub use progress::{CollectingObserver, ProgressObserver};
pub use uploader::{EvidenceUploader, UploadAuth};
