use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use custody_types::{Address, Cid};

use crate::error::StorageResult;
use crate::progress::ProgressObserver;

/// Signed authorization for an encrypted upload.
///
/// The signature is the wallet's personal-message signature over the
/// challenge obtained from [`EvidenceUploader::auth_message`] for the same
/// account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadAuth {
    pub account: Address,
    pub signature: String,
}

/// Seam to the storage network's upload surface.
///
/// Encrypted uploads need an [`UploadAuth`]; the plain path needs none.
/// Every method returns the network-assigned CID, and only the network
/// assigns CIDs.
#[async_trait]
pub trait EvidenceUploader: Send + Sync {
    /// Fetch the challenge message the wallet must sign to authorize
    /// encrypted uploads for `account`.
    async fn auth_message(&self, account: Address) -> StorageResult<String>;

    /// Upload file bytes encrypted to the uploader's account.
    async fn upload_encrypted(
        &self,
        name: &str,
        data: Bytes,
        auth: &UploadAuth,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid>;

    /// Upload a text payload encrypted to the uploader's account.
    async fn upload_text_encrypted(
        &self,
        text: &str,
        name: &str,
        auth: &UploadAuth,
    ) -> StorageResult<Cid>;

    /// Upload file bytes without encryption.
    async fn upload_plain(
        &self,
        name: &str,
        data: Bytes,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid>;
}
