use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use custody_types::Address;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use tokio::sync::broadcast;

use crate::error::{WalletError, WalletResult};
use crate::provider::{EventSubscription, ProviderEvent, WalletProvider};

/// A wallet provider backed by a local secp256k1 key.
///
/// Signatures follow the personal-message scheme: the message is prefixed
/// with `"\x19Ethereum Signed Message:\n"` and its byte length before
/// hashing, and the output is the 65-byte `r || s || v` form with
/// `v` in `{27, 28}`.
pub struct LocalKeyProvider {
    key: SigningKey,
    address: Address,
    chain_id: u64,
    events: broadcast::Sender<ProviderEvent>,
}

impl LocalKeyProvider {
    /// Generate a fresh random key.
    pub fn random(chain_id: u64) -> Self {
        let mut csprng = rand::thread_rng();
        Self::from_key(SigningKey::random(&mut csprng), chain_id)
    }

    /// Load from a raw 32-byte secret.
    pub fn from_secret_bytes(bytes: &[u8], chain_id: u64) -> WalletResult<Self> {
        let key =
            SigningKey::from_slice(bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Ok(Self::from_key(key, chain_id))
    }

    /// Load from a hex-encoded secret, with or without a `0x` prefix.
    pub fn from_hex(secret: &str, chain_id: u64) -> WalletResult<Self> {
        let secret = secret.trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(secret).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Self::from_secret_bytes(&bytes, chain_id)
    }

    fn from_key(key: SigningKey, chain_id: u64) -> Self {
        let address = derive_address(&key);
        let (events, _) = broadcast::channel(16);
        Self {
            key,
            address,
            chain_id,
            events,
        }
    }

    /// The account this key controls.
    pub fn address(&self) -> Address {
        self.address
    }
}

impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LocalKeyProvider(address={}, key=<redacted>)",
            self.address
        )
    }
}

#[async_trait]
impl WalletProvider for LocalKeyProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(vec![self.address])
    }

    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        // A local key is always authorized.
        Ok(vec![self.address])
    }

    async fn chain_id(&self) -> WalletResult<u64> {
        Ok(self.chain_id)
    }

    async fn sign_message(&self, account: Address, message: &str) -> WalletResult<String> {
        if account != self.address {
            return Err(WalletError::Rejected(format!(
                "account {account} is not held by this provider"
            )));
        }
        let hash = personal_message_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    fn subscribe(&self) -> EventSubscription {
        EventSubscription::new(self.events.subscribe())
    }
}

fn derive_address(key: &SigningKey) -> Address {
    let pubkey = key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 SEC1 tag; the address is the low 20 bytes of the hash.
    let hash = keccak256(&pubkey.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

fn personal_message_hash(message: &str) -> B256 {
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message.as_bytes());
    keccak256(&data)
}
