use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// SHA-256 digest of an evidence payload.
///
/// The digest covers payload bytes only. File names, MIME types, and any
/// other metadata never contribute, so identical content always yields the
/// same digest regardless of how it was packaged. The registry contract
/// stores the lowercase hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvidenceDigest([u8; 32]);

impl EvidenceDigest {
    /// Compute the digest of raw payload bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Compute the digest of a text payload (its UTF-8 bytes).
    pub fn of_text(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    /// Create a digest from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation, exactly 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for EvidenceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvidenceDigest({})", self.short_hex())
    }
}

impl fmt::Display for EvidenceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for EvidenceDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<EvidenceDigest> for [u8; 32] {
    fn from(digest: EvidenceDigest) -> Self {
        digest.0
    }
}

// Serialized as the 64-char hex string, matching the on-chain representation.
impl Serialize for EvidenceDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EvidenceDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn of_bytes_is_deterministic() {
        let data = b"hello world";
        let d1 = EvidenceDigest::of_bytes(data);
        let d2 = EvidenceDigest::of_bytes(data);
        assert_eq!(d1, d2);
    }

    #[test]
    fn different_data_produces_different_digests() {
        let d1 = EvidenceDigest::of_bytes(b"hello");
        let d2 = EvidenceDigest::of_bytes(b"world");
        assert_ne!(d1, d2);
    }

    #[test]
    fn text_digest_matches_utf8_bytes() {
        let text = "suspect seen at 10pm";
        assert_eq!(
            EvidenceDigest::of_text(text),
            EvidenceDigest::of_bytes(text.as_bytes())
        );
    }

    #[test]
    fn known_vector_empty() {
        let d = EvidenceDigest::of_bytes(b"");
        assert_eq!(
            d.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_vector_abc() {
        let d = EvidenceDigest::of_bytes(b"abc");
        assert_eq!(
            d.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let d = EvidenceDigest::of_bytes(b"test");
        let parsed = EvidenceDigest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = EvidenceDigest::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            EvidenceDigest::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn display_is_full_hex() {
        let d = EvidenceDigest::of_bytes(b"test");
        let display = format!("{d}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, d.to_hex());
    }

    #[test]
    fn serde_uses_hex_string() {
        let d = EvidenceDigest::of_bytes(b"serde test");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let parsed: EvidenceDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, parsed);
    }

    proptest! {
        #[test]
        fn hex_is_always_64_lowercase(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let hex = EvidenceDigest::of_bytes(&data).to_hex();
            prop_assert_eq!(hex.len(), 64);
            prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        #[test]
        fn hex_roundtrip_any(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let d = EvidenceDigest::of_bytes(&data);
            prop_assert_eq!(EvidenceDigest::from_hex(&d.to_hex()).unwrap(), d);
        }
    }
}
