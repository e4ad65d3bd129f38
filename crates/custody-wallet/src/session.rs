use std::sync::Arc;

use custody_types::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{WalletError, WalletResult};
use crate::marker::ConnectMarker;
use crate::provider::{ProviderEvent, WalletProvider};

/// An established wallet session: one account on one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account: Address,
    pub chain_id: u64,
}

/// Lifecycle owner for the wallet connection.
///
/// At most one session exists per instance. All mutation goes through one
/// async mutex, so concurrent connects collapse into a single provider
/// prompt and events apply atomically.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    marker: Box<dyn ConnectMarker>,
    state: Mutex<Option<Session>>,
}

impl WalletSession {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        marker: Box<dyn ConnectMarker>,
    ) -> Self {
        Self {
            provider,
            marker,
            state: Mutex::new(None),
        }
    }

    pub fn with_provider(
        provider: Arc<dyn WalletProvider>,
        marker: Box<dyn ConnectMarker>,
    ) -> Self {
        Self::new(Some(provider), marker)
    }

    /// A session owner with no wallet available at all.
    pub fn without_provider(marker: Box<dyn ConnectMarker>) -> Self {
        Self::new(None, marker)
    }

    /// Interactively connect. Succeeding sets the durable reconnect marker.
    ///
    /// If a session already exists (including one established by a
    /// concurrent caller while this one waited), it is returned as-is and
    /// the provider is not prompted again.
    pub async fn connect(&self) -> WalletResult<Session> {
        let provider = self.provider.clone().ok_or(WalletError::NoProvider)?;
        let mut state = self.state.lock().await;
        if let Some(session) = *state {
            debug!(account = %session.account, "connect: session already established");
            return Ok(session);
        }
        let accounts = provider.request_accounts().await?;
        let account = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        let chain_id = provider.chain_id().await?;
        let session = Session { account, chain_id };
        *state = Some(session);
        self.marker.set()?;
        info!(account = %account, chain_id, "wallet connected");
        Ok(session)
    }

    /// Silently resume a prior session at startup.
    ///
    /// Only acts when the reconnect marker is set. If the provider no
    /// longer authorizes any account, the marker is cleared so later
    /// startups stay silent.
    pub async fn try_resume(&self) -> WalletResult<Option<Session>> {
        let Some(provider) = self.provider.clone() else {
            return Ok(None);
        };
        if !self.marker.is_set() {
            return Ok(None);
        }
        let mut state = self.state.lock().await;
        let accounts = provider.accounts().await?;
        match accounts.first().copied() {
            Some(account) => {
                let chain_id = provider.chain_id().await?;
                let session = Session { account, chain_id };
                *state = Some(session);
                info!(account = %account, chain_id, "wallet session resumed");
                Ok(Some(session))
            }
            None => {
                *state = None;
                self.marker.clear()?;
                debug!("resume: authorization gone, marker cleared");
                Ok(None)
            }
        }
    }

    /// Drop the session and the durable marker.
    pub async fn disconnect(&self) -> WalletResult<()> {
        let mut state = self.state.lock().await;
        *state = None;
        self.marker.clear()?;
        info!("wallet disconnected");
        Ok(())
    }

    pub async fn current(&self) -> Option<Session> {
        *self.state.lock().await
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Sign a personal message with the session account.
    pub async fn sign_message(&self, message: &str) -> WalletResult<String> {
        let provider = self.provider.clone().ok_or(WalletError::NoProvider)?;
        let session = self
            .current()
            .await
            .ok_or(WalletError::NotConnected)?;
        provider.sign_message(session.account, message).await
    }

    /// Apply one provider event.
    ///
    /// An empty `AccountsChanged` is a revocation: the session and marker
    /// both go. A non-empty one rebinds an existing session to the first
    /// account. `ChainChanged` invalidates the session outright (signer and
    /// contract binding are chain-specific) but keeps the marker so a
    /// restart can resume on the new chain.
    pub async fn apply_event(&self, event: ProviderEvent) -> WalletResult<()> {
        let mut state = self.state.lock().await;
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => {
                    *state = None;
                    self.marker.clear()?;
                    info!("accounts revoked, wallet disconnected");
                }
                Some(account) => {
                    if let Some(session) = state.as_mut() {
                        session.account = account;
                        info!(account = %account, "session rebound to new account");
                    }
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                if state.take().is_some() {
                    info!(chain_id, "chain changed, session invalidated");
                }
            }
        }
        Ok(())
    }

    /// Spawn a background task that feeds provider events into this
    /// session. The subscription and task end when the handle drops.
    pub fn spawn_event_pump(self: &Arc<Self>) -> WalletResult<EventPumpHandle> {
        let provider = self.provider.clone().ok_or(WalletError::NoProvider)?;
        let mut events = provider.subscribe();
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(error) = session.apply_event(event).await {
                    warn!(%error, "failed to apply wallet event");
                }
            }
        });
        Ok(EventPumpHandle { task })
    }
}

/// Owner of the event-pump task. Dropping it aborts the task, which in
/// turn drops the provider subscription.
pub struct EventPumpHandle {
    task: tokio::task::JoinHandle<()>,
}

impl Drop for EventPumpHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::marker::MemoryMarker;
    use crate::memory::MemoryProvider;

    fn account() -> Address {
        Address::repeat_byte(0x11)
    }

    fn session_with(provider: Arc<MemoryProvider>) -> WalletSession {
        WalletSession::with_provider(provider, Box::new(MemoryMarker::new()))
    }

    #[tokio::test]
    async fn connect_establishes_session_and_marker() {
        let provider = Arc::new(MemoryProvider::single(account(), 5));
        let marker = Box::new(MemoryMarker::new());
        let session = WalletSession::with_provider(provider.clone(), marker);
        let s = session.connect().await.unwrap();
        assert_eq!(s.account, account());
        assert_eq!(s.chain_id, 5);
        assert!(session.is_connected().await);
    }

    #[tokio::test]
    async fn connect_without_provider_fails() {
        let session = WalletSession::without_provider(Box::new(MemoryMarker::new()));
        assert!(matches!(
            session.connect().await,
            Err(WalletError::NoProvider)
        ));
    }

    #[tokio::test]
    async fn connect_with_no_accounts_fails() {
        let provider = Arc::new(MemoryProvider::new(vec![], 1));
        let session = session_with(provider);
        assert!(matches!(
            session.connect().await,
            Err(WalletError::NoAccounts)
        ));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn repeated_connect_prompts_once() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider.clone());
        let a = session.connect().await.unwrap();
        let b = session.connect().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(provider.connect_requests(), 1);
    }

    #[tokio::test]
    async fn concurrent_connects_prompt_once() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = Arc::new(session_with(provider.clone()));
        let (a, b) = tokio::join!(session.connect(), session.connect());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.connect_requests(), 1);
    }

    #[tokio::test]
    async fn rejection_leaves_no_session() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        provider.set_rejecting(true);
        let session = session_with(provider);
        assert!(matches!(
            session.connect().await,
            Err(WalletError::Rejected(_))
        ));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn resume_without_marker_is_silent() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider.clone());
        assert_eq!(session.try_resume().await.unwrap(), None);
        assert_eq!(provider.connect_requests(), 0);
    }

    #[tokio::test]
    async fn resume_with_marker_restores_session() {
        let provider = Arc::new(MemoryProvider::single(account(), 7));
        let marker = Box::new(MemoryMarker::new());
        marker.set().unwrap();
        let session = WalletSession::with_provider(provider.clone(), marker);
        let resumed = session.try_resume().await.unwrap().unwrap();
        assert_eq!(resumed.account, account());
        assert_eq!(resumed.chain_id, 7);
        // Resumption never prompts.
        assert_eq!(provider.connect_requests(), 0);
    }

    #[tokio::test]
    async fn resume_clears_marker_when_authorization_gone() {
        let provider = Arc::new(MemoryProvider::new(vec![], 1));
        let marker = Box::new(MemoryMarker::new());
        marker.set().unwrap();
        let session = WalletSession::with_provider(provider, marker);
        assert_eq!(session.try_resume().await.unwrap(), None);
        // A second resume stays silent without re-querying the marker path.
        assert_eq!(session.try_resume().await.unwrap(), None);
    }

    #[tokio::test]
    async fn disconnect_clears_session() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        session.connect().await.unwrap();
        session.disconnect().await.unwrap();
        assert!(!session.is_connected().await);
        assert_eq!(session.current().await, None);
    }

    #[tokio::test]
    async fn empty_accounts_changed_disconnects() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        session.connect().await.unwrap();
        session
            .apply_event(ProviderEvent::AccountsChanged(vec![]))
            .await
            .unwrap();
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn empty_accounts_changed_is_harmless_when_idle() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        session
            .apply_event(ProviderEvent::AccountsChanged(vec![]))
            .await
            .unwrap();
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn accounts_changed_rebinds_first_account() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        session.connect().await.unwrap();
        let next = Address::repeat_byte(0x22);
        session
            .apply_event(ProviderEvent::AccountsChanged(vec![next]))
            .await
            .unwrap();
        assert_eq!(session.current().await.unwrap().account, next);
    }

    #[tokio::test]
    async fn chain_changed_invalidates_session() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        session.connect().await.unwrap();
        session
            .apply_event(ProviderEvent::ChainChanged(10))
            .await
            .unwrap();
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn sign_message_requires_session() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = session_with(provider);
        assert!(matches!(
            session.sign_message("msg").await,
            Err(WalletError::NotConnected)
        ));
        session.connect().await.unwrap();
        let sig = session.sign_message("msg").await.unwrap();
        assert!(sig.starts_with("0x"));
    }

    #[tokio::test]
    async fn event_pump_applies_provider_events() {
        let provider = Arc::new(MemoryProvider::single(account(), 1));
        let session = Arc::new(session_with(provider.clone()));
        let _pump = session.spawn_event_pump().unwrap();
        session.connect().await.unwrap();
        provider.emit(ProviderEvent::AccountsChanged(vec![]));
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while session.is_connected().await {
            assert!(tokio::time::Instant::now() < deadline, "event not applied");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
