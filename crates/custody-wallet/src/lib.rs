//! Wallet session lifecycle for the Custody client.
//!
//! A [`WalletSession`] owns the single connection to a wallet provider:
//! interactive connect, silent resume via a durable [`ConnectMarker`],
//! disconnect, and reaction to provider events (account and chain
//! changes). Providers implement [`WalletProvider`]; a local secp256k1
//! signer ([`LocalKeyProvider`]) serves command-line use, and
//! [`MemoryProvider`] serves tests.

pub mod error;
pub mod local;
pub mod marker;
pub mod memory;
pub mod provider;
pub mod session;

pub use error::{WalletError, WalletResult};
pub use local::LocalKeyProvider;
pub use marker::{ConnectMarker, FileMarker, MemoryMarker};
pub use memory::MemoryProvider;
pub use provider::{EventSubscription, ProviderEvent, WalletProvider};
pub use session::{EventPumpHandle, Session, WalletSession};
