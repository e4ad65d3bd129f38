//! The hash-upload-submit pipeline.
//!
//! One orchestration validates the draft, resolves the payload bytes,
//! digests them, uploads to storage, and only then sends the single
//! `submitEvidenceToCase` transaction. The ordering is load-bearing: a
//! record never reaches the chain without a storage CID for the same
//! bytes, and a failed upload stops everything before the chain is
//! touched.

use std::sync::Arc;

use bytes::Bytes;
use custody_registry::{ChainTransport, RegistryGateway, TxHash};
use custody_storage::{EvidenceUploader, ProgressObserver, StorageError, UploadAuth};
use custody_types::{CaseId, Cid, EvidenceDigest, SubmissionRecord};
use custody_wallet::{Session, WalletSession};
use tracing::{info, warn};

use crate::draft::{EvidencePayload, SubmissionDraft};
use crate::error::{SubmitError, SubmitResult};

/// Whether uploads go through the encrypted path.
///
/// Encrypted is canonical; plain exists for payloads that are public
/// record anyway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadMode {
    #[default]
    Encrypted,
    Plain,
}

/// Where the current orchestration stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Uploading,
    AwaitingChain,
    Succeeded,
    Failed,
}

/// Everything a successful submission produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub cid: Cid,
    pub digest: EvidenceDigest,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Drives one submission at a time through the pipeline.
///
/// `submit` takes `&mut self`, so two orchestrations can never interleave
/// on the same instance.
pub struct SubmissionOrchestrator<T: ChainTransport + ?Sized> {
    session: Arc<WalletSession>,
    uploader: Arc<dyn EvidenceUploader>,
    gateway: RegistryGateway<T>,
    mode: UploadMode,
    observer: Option<Arc<dyn ProgressObserver>>,
    state: SubmissionState,
}

impl<T: ChainTransport + ?Sized> SubmissionOrchestrator<T> {
    pub fn new(
        session: Arc<WalletSession>,
        uploader: Arc<dyn EvidenceUploader>,
        gateway: RegistryGateway<T>,
    ) -> Self {
        Self {
            session,
            uploader,
            gateway,
            mode: UploadMode::default(),
            observer: None,
            state: SubmissionState::Idle,
        }
    }

    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
    }

    /// Run the full pipeline for `draft`.
    ///
    /// The draft is borrowed, never consumed; after a failure the caller
    /// still holds it unchanged for correction and resubmission.
    pub async fn submit(&mut self, draft: &SubmissionDraft) -> SubmitResult<SubmissionOutcome> {
        let result = self.run(draft).await;
        self.state = match &result {
            Ok(_) => SubmissionState::Succeeded,
            Err(err) => {
                warn!(error = %err, "submission failed");
                SubmissionState::Failed
            }
        };
        result
    }

    async fn run(&mut self, draft: &SubmissionDraft) -> SubmitResult<SubmissionOutcome> {
        self.state = SubmissionState::Validating;
        let case_id = CaseId::parse(draft.case_id())
            .map_err(|e| SubmitError::Validation(e.to_string()))?;
        let session = self
            .session
            .current()
            .await
            .ok_or_else(|| SubmitError::Validation("no active wallet session".into()))?;
        let payload = draft
            .payload()
            .ok_or_else(|| SubmitError::Validation("draft selects no evidence payload".into()))?;

        let (name, bytes) = resolve_payload(payload).await?;
        let digest = EvidenceDigest::of_bytes(&bytes);

        self.state = SubmissionState::Uploading;
        let cid = self.upload(&session, payload, &name, bytes).await?;
        info!(case = %case_id, cid = %cid.preview(), digest = %digest.short_hex(), "evidence stored");

        let record = SubmissionRecord::new(
            case_id,
            digest,
            cid.clone(),
            draft.submitter(),
            draft.key_ref(),
        );

        self.state = SubmissionState::AwaitingChain;
        let pending = self
            .gateway
            .submit_evidence(session.account, &record)
            .await
            .map_err(|source| SubmitError::Chain { cid: cid.clone(), digest, source })?;
        let inclusion = pending
            .confirmed()
            .await
            .map_err(|source| SubmitError::Chain { cid: cid.clone(), digest, source })?;
        info!(
            case = %case_id,
            tx = %inclusion.tx_hash,
            block = inclusion.block_number,
            "evidence submitted on chain"
        );

        Ok(SubmissionOutcome {
            cid,
            digest,
            tx_hash: inclusion.tx_hash,
            block_number: inclusion.block_number,
        })
    }

    async fn upload(
        &self,
        session: &Session,
        payload: &EvidencePayload,
        name: &str,
        bytes: Vec<u8>,
    ) -> SubmitResult<Cid> {
        let cid = match self.mode {
            UploadMode::Encrypted => {
                let message = self.uploader.auth_message(session.account).await?;
                let signature = self
                    .session
                    .sign_message(&message)
                    .await
                    .map_err(|e| StorageError::Auth(e.to_string()))?;
                let auth = UploadAuth { account: session.account, signature };
                match payload {
                    EvidencePayload::Text(text) => {
                        self.uploader.upload_text_encrypted(text, name, &auth).await?
                    }
                    EvidencePayload::File(_) => {
                        self.uploader
                            .upload_encrypted(name, Bytes::from(bytes), &auth, self.observer.clone())
                            .await?
                    }
                }
            }
            UploadMode::Plain => {
                self.uploader
                    .upload_plain(name, Bytes::from(bytes), self.observer.clone())
                    .await?
            }
        };
        Ok(cid)
    }
}

/// Payload bytes plus the name the storage network will file them under.
async fn resolve_payload(payload: &EvidencePayload) -> SubmitResult<(String, Vec<u8>)> {
    match payload {
        EvidencePayload::File(path) => {
            let bytes = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("evidence.bin")
                .to_owned();
            Ok((name, bytes))
        }
        EvidencePayload::Text(text) => Ok(("evidence.txt".into(), text.as_bytes().to_vec())),
    }
}
