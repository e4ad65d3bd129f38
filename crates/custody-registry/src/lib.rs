//! Chain gateway for the Custody system.
//!
//! [`RegistryGateway`] is the typed surface over the deployed registry
//! contract; it speaks through a [`ChainTransport`], which is either the
//! JSON-RPC [`RpcTransport`] or the test-only [`InMemoryChain`]. The
//! [`abi`] module carries the small codec both sides share.

pub mod abi;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod rpc;
pub mod transport;

pub use error::{RegistryError, RegistryResult};
pub use gateway::{PendingTransaction, RegistryGateway};
pub use memory::{DecodedSubmission, InMemoryChain};
pub use rpc::RpcTransport;
pub use transport::{ChainTransport, TxHash, TxInclusion};
