use async_trait::async_trait;
use custody_types::Address;
use tokio::sync::broadcast;

use crate::error::WalletResult;

/// Events a wallet provider pushes to its subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The authorized account set changed. An empty list means the user
    /// revoked access entirely.
    AccountsChanged(Vec<Address>),
    /// The provider switched to a different chain.
    ChainChanged(u64),
}

/// Interface to an external wallet.
///
/// `request_accounts` is the interactive path and may prompt the user;
/// `accounts` is the silent query used for session resumption.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>>;
    async fn accounts(&self) -> WalletResult<Vec<Address>>;
    async fn chain_id(&self) -> WalletResult<u64>;
    /// Personal-message signature over `message`, as 0x-prefixed hex.
    async fn sign_message(&self, account: Address, message: &str) -> WalletResult<String>;
    /// Subscribe to provider events. Dropping the returned handle releases
    /// the subscription.
    fn subscribe(&self) -> EventSubscription;
}

/// An owned subscription to provider events.
pub struct EventSubscription {
    rx: broadcast::Receiver<ProviderEvent>,
}

impl EventSubscription {
    pub fn new(rx: broadcast::Receiver<ProviderEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event, skipping over any the subscriber was too
    /// slow to see. Returns `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_receives_events() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = EventSubscription::new(rx);
        tx.send(ProviderEvent::ChainChanged(5)).unwrap();
        assert_eq!(sub.recv().await, Some(ProviderEvent::ChainChanged(5)));
    }

    #[tokio::test]
    async fn subscription_ends_when_sender_dropped() {
        let (tx, rx) = broadcast::channel::<ProviderEvent>(8);
        let mut sub = EventSubscription::new(rx);
        drop(tx);
        assert_eq!(sub.recv().await, None);
    }
}
