//! In-memory chain backing tests.
//!
//! [`InMemoryChain`] decodes the same calldata the real contract would
//! receive and keeps its effects in a mutex-guarded state table, so
//! gateway and orchestrator tests can assert on what actually reached
//! the chain rather than on mocked method calls.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{keccak256, B256, U256};
use async_trait::async_trait;
use custody_types::Address;

use crate::abi::{self, functions, Decoder, Token};
use crate::error::{RegistryError, RegistryResult};
use crate::transport::{ChainTransport, TxHash, TxInclusion};

/// Arbitrary fixed epoch so created-at stamps are stable in assertions.
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// One decoded `submitEvidenceToCase` call, as the chain saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSubmission {
    pub case_id: u64,
    pub digest: String,
    pub cid: String,
    pub submitter: u8,
    pub key_ref: String,
}

#[derive(Clone, Debug)]
struct StoredCase {
    metadata_hash: String,
    public_key: String,
    creator: Address,
    created_at: u64,
    is_open: bool,
}

#[derive(Default)]
struct ChainState {
    cases: HashMap<u64, StoredCase>,
    submissions: Vec<DecodedSubmission>,
    approvals: Vec<(u64, u64)>,
    tips: Vec<(u64, u64)>,
    roles: HashMap<(B256, Address), bool>,
    police: HashMap<Address, bool>,
    receipts: HashMap<TxHash, TxInclusion>,
    sends: usize,
    nonce: u64,
    block: u64,
    fail_sends: bool,
    revert_next: bool,
}

/// Test double implementing [`ChainTransport`] against real calldata.
#[derive(Default)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_police(&self, account: Address, is_police: bool) {
        self.lock().police.insert(account, is_police);
    }

    pub fn grant_role(&self, role: B256, account: Address) {
        self.lock().roles.insert((role, account), true);
    }

    /// Every `send` after this fails at the transport layer, before any
    /// state change.
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// The next transaction is included but reverts, leaving state
    /// untouched.
    pub fn set_revert_next(&self, revert: bool) {
        self.lock().revert_next = revert;
    }

    /// Number of transactions the chain accepted, reverted or not.
    pub fn sends(&self) -> usize {
        self.lock().sends
    }

    pub fn submissions(&self) -> Vec<DecodedSubmission> {
        self.lock().submissions.clone()
    }

    pub fn approvals(&self) -> Vec<(u64, u64)> {
        self.lock().approvals.clone()
    }

    pub fn tips(&self) -> Vec<(u64, u64)> {
        self.lock().tips.clone()
    }

    pub fn has_case(&self, id: u64) -> bool {
        self.lock().cases.contains_key(&id)
    }

    pub fn case_public_key(&self, id: u64) -> Option<String> {
        self.lock().cases.get(&id).map(|c| c.public_key.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(state: &mut ChainState, from: Address, data: &[u8]) -> RegistryResult<bool> {
        let (sel, d) = Decoder::from_calldata(data)?;
        if sel == abi::selector(functions::CREATE_CASE_WITH_ID) {
            let id = d.u64(0)?;
            if state.cases.contains_key(&id) {
                return Ok(false);
            }
            let created_at = GENESIS_TIMESTAMP + state.cases.len() as u64;
            state.cases.insert(
                id,
                StoredCase {
                    metadata_hash: d.string(1)?,
                    public_key: d.string(2)?,
                    creator: from,
                    created_at,
                    is_open: true,
                },
            );
            Ok(true)
        } else if sel == abi::selector(functions::SUBMIT_EVIDENCE_TO_CASE) {
            state.submissions.push(DecodedSubmission {
                case_id: d.u64(0)?,
                digest: d.string(1)?,
                cid: d.string(2)?,
                submitter: d.u8(3)?,
                key_ref: d.string(4)?,
            });
            Ok(true)
        } else if sel == abi::selector(functions::APPROVE_EVIDENCE) {
            let case_id = d.u64(0)?;
            if !state.cases.contains_key(&case_id) {
                return Ok(false);
            }
            state.approvals.push((case_id, d.u64(1)?));
            Ok(true)
        } else if sel == abi::selector(functions::LINK_TIP_TO_CASE) {
            state.tips.push((d.u64(0)?, d.u64(1)?));
            Ok(true)
        } else {
            Err(RegistryError::Decode(format!(
                "unknown send selector {}",
                hex::encode(sel)
            )))
        }
    }
}

#[async_trait]
impl ChainTransport for InMemoryChain {
    async fn call(&self, _to: Address, data: Vec<u8>) -> RegistryResult<Vec<u8>> {
        let state = self.lock();
        let (sel, d) = Decoder::from_calldata(&data)?;
        if sel == abi::selector(functions::IS_POLICE) {
            let account = d.address(0)?;
            let answer = state.police.get(&account).copied().unwrap_or(false);
            Ok(abi::encode_tokens(&[Token::Bool(answer)]))
        } else if sel == abi::selector(functions::HAS_ROLE) {
            let role = d.bytes32(0)?;
            let account = d.address(1)?;
            let answer = state.roles.get(&(role, account)).copied().unwrap_or(false);
            Ok(abi::encode_tokens(&[Token::Bool(answer)]))
        } else if sel == abi::selector(functions::CASES) {
            let id = d.u64(0)?;
            let tokens = match state.cases.get(&id) {
                Some(case) => vec![
                    Token::Uint(U256::from(id)),
                    Token::Str(case.metadata_hash.clone()),
                    Token::Addr(case.creator),
                    Token::Uint(U256::from(case.created_at)),
                    Token::Bool(case.is_open),
                ],
                None => vec![
                    Token::Uint(U256::ZERO),
                    Token::Str(String::new()),
                    Token::Addr(Address::ZERO),
                    Token::Uint(U256::ZERO),
                    Token::Bool(false),
                ],
            };
            Ok(abi::encode_tokens(&tokens))
        } else {
            Err(RegistryError::Decode(format!(
                "unknown call selector {}",
                hex::encode(sel)
            )))
        }
    }

    async fn send(&self, from: Address, _to: Address, data: Vec<u8>) -> RegistryResult<TxHash> {
        let mut state = self.lock();
        if state.fail_sends {
            return Err(RegistryError::Transport("send refused".into()));
        }
        state.sends += 1;
        state.nonce += 1;
        state.block += 1;
        let mut preimage = data.clone();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        let tx = TxHash::new(keccak256(&preimage));
        let success = if state.revert_next {
            state.revert_next = false;
            false
        } else {
            Self::apply(&mut state, from, &data)?
        };
        let block_number = state.block;
        state
            .receipts
            .insert(tx, TxInclusion { tx_hash: tx, block_number, success });
        Ok(tx)
    }

    async fn wait_for_inclusion(&self, tx: TxHash) -> RegistryResult<TxInclusion> {
        self.lock()
            .receipts
            .get(&tx)
            .copied()
            .ok_or_else(|| RegistryError::Transport(format!("unknown transaction {tx}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode_call;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[tokio::test]
    async fn create_case_then_read_back() {
        let chain = InMemoryChain::new();
        let data = encode_call(
            functions::CREATE_CASE_WITH_ID,
            &[
                Token::Uint(U256::from(7u64)),
                Token::Str("meta".into()),
                Token::Str("pubkey".into()),
            ],
        );
        let tx = chain.send(addr(1), addr(9), data).await.unwrap();
        assert!(chain.wait_for_inclusion(tx).await.unwrap().success);

        let query = encode_call(functions::CASES, &[Token::Uint(U256::from(7u64))]);
        let out = chain.call(addr(9), query).await.unwrap();
        let d = Decoder::new(&out);
        assert_eq!(d.u64(0).unwrap(), 7);
        assert_eq!(d.string(1).unwrap(), "meta");
        assert_eq!(d.address(2).unwrap(), addr(1));
        assert!(d.bool(4).unwrap());
    }

    #[tokio::test]
    async fn duplicate_case_reverts_without_clobbering() {
        let chain = InMemoryChain::new();
        let make = |meta: &str| {
            encode_call(
                functions::CREATE_CASE_WITH_ID,
                &[
                    Token::Uint(U256::from(7u64)),
                    Token::Str(meta.into()),
                    Token::Str(String::new()),
                ],
            )
        };
        let first = chain.send(addr(1), addr(9), make("original")).await.unwrap();
        assert!(chain.wait_for_inclusion(first).await.unwrap().success);

        let second = chain.send(addr(2), addr(9), make("imposter")).await.unwrap();
        assert!(!chain.wait_for_inclusion(second).await.unwrap().success);

        let query = encode_call(functions::CASES, &[Token::Uint(U256::from(7u64))]);
        let out = chain.call(addr(9), query).await.unwrap();
        assert_eq!(Decoder::new(&out).string(1).unwrap(), "original");
    }

    #[tokio::test]
    async fn missing_case_reads_as_zeroes() {
        let chain = InMemoryChain::new();
        let query = encode_call(functions::CASES, &[Token::Uint(U256::from(404u64))]);
        let out = chain.call(addr(9), query).await.unwrap();
        let d = Decoder::new(&out);
        assert_eq!(d.u64(0).unwrap(), 0);
        assert_eq!(d.string(1).unwrap(), "");
        assert_eq!(d.address(2).unwrap(), Address::ZERO);
        assert!(!d.bool(4).unwrap());
    }

    #[tokio::test]
    async fn submission_is_logged_verbatim() {
        let chain = InMemoryChain::new();
        let data = encode_call(
            functions::SUBMIT_EVIDENCE_TO_CASE,
            &[
                Token::Uint(U256::from(101u64)),
                Token::Str("d".repeat(64)),
                Token::Str("bafy123".into()),
                Token::Uint(U256::from(1u64)),
                Token::Str(String::new()),
            ],
        );
        let tx = chain.send(addr(3), addr(9), data).await.unwrap();
        assert!(chain.wait_for_inclusion(tx).await.unwrap().success);
        assert_eq!(
            chain.submissions(),
            vec![DecodedSubmission {
                case_id: 101,
                digest: "d".repeat(64),
                cid: "bafy123".into(),
                submitter: 1,
                key_ref: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn police_and_role_queries() {
        let chain = InMemoryChain::new();
        chain.set_police(addr(5), true);
        chain.grant_role(B256::repeat_byte(0x3c), addr(6));

        let q = encode_call(functions::IS_POLICE, &[Token::Addr(addr(5))]);
        let out = chain.call(addr(9), q).await.unwrap();
        assert!(Decoder::new(&out).bool(0).unwrap());

        let q = encode_call(functions::IS_POLICE, &[Token::Addr(addr(6))]);
        let out = chain.call(addr(9), q).await.unwrap();
        assert!(!Decoder::new(&out).bool(0).unwrap());

        let q = encode_call(
            functions::HAS_ROLE,
            &[Token::Bytes32(B256::repeat_byte(0x3c)), Token::Addr(addr(6))],
        );
        let out = chain.call(addr(9), q).await.unwrap();
        assert!(Decoder::new(&out).bool(0).unwrap());
    }

    #[tokio::test]
    async fn failed_sends_leave_no_trace() {
        let chain = InMemoryChain::new();
        chain.set_fail_sends(true);
        let data = encode_call(
            functions::LINK_TIP_TO_CASE,
            &[Token::Uint(U256::from(1u64)), Token::Uint(U256::from(2u64))],
        );
        assert!(chain.send(addr(1), addr(9), data).await.is_err());
        assert_eq!(chain.sends(), 0);
        assert!(chain.tips().is_empty());
    }

    #[tokio::test]
    async fn revert_next_counts_the_send_but_skips_effects() {
        let chain = InMemoryChain::new();
        chain.set_revert_next(true);
        let data = encode_call(
            functions::LINK_TIP_TO_CASE,
            &[Token::Uint(U256::from(1u64)), Token::Uint(U256::from(2u64))],
        );
        let tx = chain.send(addr(1), addr(9), data).await.unwrap();
        assert!(!chain.wait_for_inclusion(tx).await.unwrap().success);
        assert_eq!(chain.sends(), 1);
        assert!(chain.tips().is_empty());
    }

    #[tokio::test]
    async fn approve_requires_existing_case() {
        let chain = InMemoryChain::new();
        let data = encode_call(
            functions::APPROVE_EVIDENCE,
            &[Token::Uint(U256::from(55u64)), Token::Uint(U256::from(0u64))],
        );
        let tx = chain.send(addr(1), addr(9), data).await.unwrap();
        assert!(!chain.wait_for_inclusion(tx).await.unwrap().success);
        assert!(chain.approvals().is_empty());
    }

    #[tokio::test]
    async fn unknown_receipt_is_an_error() {
        let chain = InMemoryChain::new();
        let tx = TxHash::new(B256::repeat_byte(0x11));
        assert!(chain.wait_for_inclusion(tx).await.is_err());
    }
}
