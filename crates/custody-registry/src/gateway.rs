//! Typed call surface over the registry contract.
//!
//! Each write returns a [`PendingTransaction`] so callers decide whether
//! to wait for inclusion. Reads decode the contract's return words into
//! the shared custody types.

use std::sync::Arc;

use alloy_primitives::{B256, U256};
use custody_types::{Address, CaseId, CaseRecord, RoleId, SubmissionRecord};
use tracing::info;

use crate::abi::{self, functions, Decoder, Token};
use crate::error::{RegistryError, RegistryResult};
use crate::transport::{ChainTransport, TxHash, TxInclusion};

/// A transaction the chain accepted but has not necessarily included.
pub struct PendingTransaction<T: ChainTransport + ?Sized> {
    transport: Arc<T>,
    tx: TxHash,
}

impl<T: ChainTransport + ?Sized> PendingTransaction<T> {
    pub fn tx_hash(&self) -> TxHash {
        self.tx
    }

    /// Wait for inclusion, treating a reverted transaction as an error.
    pub async fn confirmed(self) -> RegistryResult<TxInclusion> {
        let inclusion = self.transport.wait_for_inclusion(self.tx).await?;
        if !inclusion.success {
            return Err(RegistryError::Reverted { tx: self.tx.to_hex() });
        }
        Ok(inclusion)
    }
}

impl<T: ChainTransport + ?Sized> std::fmt::Debug for PendingTransaction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx", &self.tx.to_hex())
            .finish()
    }
}

/// Gateway bound to one deployed registry contract.
pub struct RegistryGateway<T: ChainTransport + ?Sized> {
    transport: Arc<T>,
    contract: Address,
}

impl<T: ChainTransport + ?Sized> RegistryGateway<T> {
    pub fn new(transport: Arc<T>, contract: Address) -> Self {
        Self { transport, contract }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub async fn is_police(&self, account: Address) -> RegistryResult<bool> {
        let data = abi::encode_call(functions::IS_POLICE, &[Token::Addr(account)]);
        let out = self.transport.call(self.contract, data).await?;
        Decoder::new(&out).bool(0)
    }

    pub async fn has_role(&self, role: &RoleId, account: Address) -> RegistryResult<bool> {
        let data = abi::encode_call(
            functions::HAS_ROLE,
            &[Token::Bytes32(B256::from(*role.as_bytes())), Token::Addr(account)],
        );
        let out = self.transport.call(self.contract, data).await?;
        Decoder::new(&out).bool(0)
    }

    /// Read a case row. The contract returns an all-zero row for ids it
    /// never saw, which maps to `None` here.
    pub async fn get_case(&self, id: CaseId) -> RegistryResult<Option<CaseRecord>> {
        let data = abi::encode_call(functions::CASES, &[Token::Uint(id.to_u256())]);
        let out = self.transport.call(self.contract, data).await?;
        let d = Decoder::new(&out);
        let record = CaseRecord {
            id: CaseId::new(d.u64(0)?),
            metadata_hash: d.string(1)?,
            creator: d.address(2)?,
            created_at: d.u64(3)?,
            is_open: d.bool(4)?,
        };
        if record.is_sentinel() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    pub async fn create_case(
        &self,
        from: Address,
        id: CaseId,
        metadata_hash: &str,
        public_key: &str,
    ) -> RegistryResult<PendingTransaction<T>> {
        let data = abi::encode_call(
            functions::CREATE_CASE_WITH_ID,
            &[
                Token::Uint(id.to_u256()),
                Token::Str(metadata_hash.to_owned()),
                Token::Str(public_key.to_owned()),
            ],
        );
        info!(case = %id, "creating case");
        self.send(from, data).await
    }

    pub async fn submit_evidence(
        &self,
        from: Address,
        record: &SubmissionRecord,
    ) -> RegistryResult<PendingTransaction<T>> {
        let data = abi::encode_call(
            functions::SUBMIT_EVIDENCE_TO_CASE,
            &[
                Token::Uint(record.case_id.to_u256()),
                Token::Str(record.digest.to_hex()),
                Token::Str(record.cid.as_str().to_owned()),
                Token::Uint(U256::from(record.submitter.as_u8())),
                Token::Str(record.key_ref.clone()),
            ],
        );
        info!(case = %record.case_id, cid = %record.cid.preview(), "submitting evidence");
        self.send(from, data).await
    }

    pub async fn approve_evidence(
        &self,
        from: Address,
        case_id: CaseId,
        evidence_index: u64,
    ) -> RegistryResult<PendingTransaction<T>> {
        let data = abi::encode_call(
            functions::APPROVE_EVIDENCE,
            &[Token::Uint(case_id.to_u256()), Token::Uint(U256::from(evidence_index))],
        );
        self.send(from, data).await
    }

    pub async fn link_tip(
        &self,
        from: Address,
        tip_id: u64,
        case_id: CaseId,
    ) -> RegistryResult<PendingTransaction<T>> {
        let data = abi::encode_call(
            functions::LINK_TIP_TO_CASE,
            &[Token::Uint(U256::from(tip_id)), Token::Uint(case_id.to_u256())],
        );
        self.send(from, data).await
    }

    async fn send(&self, from: Address, data: Vec<u8>) -> RegistryResult<PendingTransaction<T>> {
        let tx = self.transport.send(from, self.contract, data).await?;
        Ok(PendingTransaction { transport: Arc::clone(&self.transport), tx })
    }
}
