use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use custody_types::{Address, Cid};

use crate::error::{StorageError, StorageResult};
use crate::progress::ProgressObserver;
use crate::uploader::{EvidenceUploader, UploadAuth};

/// One upload as the in-memory backend saw it.
#[derive(Clone, Debug)]
pub struct StoredUpload {
    pub name: String,
    pub data: Vec<u8>,
    pub encrypted: bool,
    pub auth: Option<UploadAuth>,
    pub cid: Cid,
}

/// In-memory [`EvidenceUploader`] for tests.
///
/// Assigns sequential CIDs (or one fixed CID), records every upload, and
/// can be told to fail the auth or upload steps.
#[derive(Default)]
pub struct InMemoryUploader {
    fixed_cid: Mutex<Option<String>>,
    fail_auth: AtomicBool,
    fail_uploads: AtomicBool,
    uploads: Mutex<Vec<StoredUpload>>,
    auth_requests: AtomicUsize,
}

impl InMemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload return `cid` instead of a sequential one.
    pub fn with_fixed_cid(cid: impl Into<String>) -> Self {
        let this = Self::default();
        this.set_fixed_cid(cid);
        this
    }

    pub fn set_fixed_cid(&self, cid: impl Into<String>) {
        *self.fixed_cid.lock().unwrap() = Some(cid.into());
    }

    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn auth_requests(&self) -> usize {
        self.auth_requests.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(
        &self,
        name: &str,
        data: Vec<u8>,
        encrypted: bool,
        auth: Option<UploadAuth>,
    ) -> StorageResult<Cid> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("injected upload failure".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        let assigned = match self.fixed_cid.lock().unwrap().as_ref() {
            Some(fixed) => fixed.clone(),
            None => format!("bafymem{}", uploads.len()),
        };
        let cid = Cid::new(assigned).map_err(|e| StorageError::Upload(e.to_string()))?;
        uploads.push(StoredUpload {
            name: name.to_string(),
            data,
            encrypted,
            auth,
            cid: cid.clone(),
        });
        Ok(cid)
    }
}

#[async_trait]
impl EvidenceUploader for InMemoryUploader {
    async fn auth_message(&self, account: Address) -> StorageResult<String> {
        self.auth_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(StorageError::Auth("injected auth failure".into()));
        }
        Ok(format!("custody-auth-challenge:{account}"))
    }

    async fn upload_encrypted(
        &self,
        name: &str,
        data: Bytes,
        auth: &UploadAuth,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid> {
        let cid = self.record(name, data.to_vec(), true, Some(auth.clone()))?;
        if let Some(observer) = observer {
            observer.on_progress(100.0);
        }
        Ok(cid)
    }

    async fn upload_text_encrypted(
        &self,
        text: &str,
        name: &str,
        auth: &UploadAuth,
    ) -> StorageResult<Cid> {
        self.record(name, text.as_bytes().to_vec(), true, Some(auth.clone()))
    }

    async fn upload_plain(
        &self,
        name: &str,
        data: Bytes,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid> {
        let cid = self.record(name, data.to_vec(), false, None)?;
        if let Some(observer) = observer {
            observer.on_progress(100.0);
        }
        Ok(cid)
    }
}
