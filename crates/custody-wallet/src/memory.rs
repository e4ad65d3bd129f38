use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::keccak256;
use async_trait::async_trait;
use custody_types::Address;
use tokio::sync::broadcast;

use crate::error::{WalletError, WalletResult};
use crate::provider::{EventSubscription, ProviderEvent, WalletProvider};

/// Scriptable in-memory wallet provider for tests.
///
/// Counts interactive account requests, can be told to reject them, and
/// exposes [`MemoryProvider::emit`] to simulate provider events.
pub struct MemoryProvider {
    accounts: Mutex<Vec<Address>>,
    chain_id: AtomicU64,
    rejecting: AtomicBool,
    connect_requests: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl MemoryProvider {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(accounts),
            chain_id: AtomicU64::new(chain_id),
            rejecting: AtomicBool::new(false),
            connect_requests: AtomicUsize::new(0),
            events,
        }
    }

    pub fn single(account: Address, chain_id: u64) -> Self {
        Self::new(vec![account], chain_id)
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// Make subsequent interactive requests fail as user rejections.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// How many times `request_accounts` was called.
    pub fn connect_requests(&self) -> usize {
        self.connect_requests.load(Ordering::SeqCst)
    }

    /// Push an event to all subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for MemoryProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        self.connect_requests.fetch_add(1, Ordering::SeqCst);
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("user rejected the request".into()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> WalletResult<u64> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    async fn sign_message(&self, account: Address, message: &str) -> WalletResult<String> {
        if !self.accounts.lock().unwrap().contains(&account) {
            return Err(WalletError::Rejected(format!(
                "account {account} is not authorized"
            )));
        }
        // Deterministic stand-in, not a real signature.
        let mut data = account.as_slice().to_vec();
        data.extend_from_slice(message.as_bytes());
        Ok(format!("0x{}", hex::encode(keccak256(&data))))
    }

    fn subscribe(&self) -> EventSubscription {
        EventSubscription::new(self.events.subscribe())
    }
}
