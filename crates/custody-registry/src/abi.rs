//! Minimal ABI codec for the registry contract's call surface.
//!
//! Covers exactly what the gateway needs: 4-byte selectors, static words
//! for integers, addresses, fixed bytes and booleans, and head/tail
//! encoding for dynamic strings.

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::error::{RegistryError, RegistryResult};

/// Function signatures of the deployed registry contract.
pub mod functions {
    pub const IS_POLICE: &str = "isPolice(address)";
    pub const HAS_ROLE: &str = "hasRole(bytes32,address)";
    pub const CASES: &str = "cases(uint256)";
    pub const CREATE_CASE_WITH_ID: &str = "createCaseWithId(uint256,string,string)";
    pub const SUBMIT_EVIDENCE_TO_CASE: &str =
        "submitEvidenceToCase(uint256,string,string,uint8,string)";
    pub const APPROVE_EVIDENCE: &str = "approveEvidence(uint256,uint256)";
    pub const LINK_TIP_TO_CASE: &str = "linkTipToCase(uint256,uint256)";
}

/// A single encodable argument.
#[derive(Clone, Debug)]
pub enum Token {
    Uint(U256),
    Addr(Address),
    Bytes32(B256),
    Bool(bool),
    Str(String),
}

/// First four bytes of the keccak-256 of the signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Full calldata: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode_tokens(tokens));
    out
}

/// Head/tail encoding of an argument list.
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&v.to_be_bytes::<32>()),
            Token::Addr(a) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(a.as_slice());
                head.extend_from_slice(&word);
            }
            Token::Bytes32(b) => head.extend_from_slice(b.as_slice()),
            Token::Bool(b) => {
                let mut word = [0u8; 32];
                word[31] = *b as u8;
                head.extend_from_slice(&word);
            }
            Token::Str(s) => {
                let offset = head_len + tail.len();
                head.extend_from_slice(&U256::from(offset as u64).to_be_bytes::<32>());
                tail.extend_from_slice(&U256::from(s.len() as u64).to_be_bytes::<32>());
                tail.extend_from_slice(s.as_bytes());
                let padding = (32 - s.len() % 32) % 32;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }
    head.extend(tail);
    head
}

/// Word-indexed reader over an encoded argument or return region.
///
/// Indices address 32-byte head words; dynamic values are reached through
/// the offset stored in their head word.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Split calldata into its selector and an argument decoder.
    pub fn from_calldata(data: &'a [u8]) -> RegistryResult<([u8; 4], Self)> {
        if data.len() < 4 {
            return Err(RegistryError::Decode("calldata shorter than selector".into()));
        }
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&data[..4]);
        Ok((sel, Self::new(&data[4..])))
    }

    fn word(&self, index: usize) -> RegistryResult<&'a [u8]> {
        let start = index * 32;
        let end = start + 32;
        if self.data.len() < end {
            return Err(RegistryError::Decode(format!(
                "word {index} out of range ({} bytes)",
                self.data.len()
            )));
        }
        Ok(&self.data[start..end])
    }

    pub fn u256(&self, index: usize) -> RegistryResult<U256> {
        Ok(U256::from_be_slice(self.word(index)?))
    }

    pub fn u64(&self, index: usize) -> RegistryResult<u64> {
        let value = self.u256(index)?;
        u64::try_from(value)
            .map_err(|_| RegistryError::Decode(format!("word {index} exceeds u64")))
    }

    pub fn u8(&self, index: usize) -> RegistryResult<u8> {
        let value = self.u64(index)?;
        u8::try_from(value)
            .map_err(|_| RegistryError::Decode(format!("word {index} exceeds u8")))
    }

    pub fn address(&self, index: usize) -> RegistryResult<Address> {
        Ok(Address::from_slice(&self.word(index)?[12..]))
    }

    pub fn bytes32(&self, index: usize) -> RegistryResult<B256> {
        Ok(B256::from_slice(self.word(index)?))
    }

    pub fn bool(&self, index: usize) -> RegistryResult<bool> {
        Ok(self.word(index)?.iter().any(|b| *b != 0))
    }

    /// Read the string whose offset sits in head word `index`.
    pub fn string(&self, index: usize) -> RegistryResult<String> {
        let offset = usize::try_from(self.u256(index)?)
            .map_err(|_| RegistryError::Decode("string offset exceeds usize".into()))?;
        if self.data.len() < offset + 32 {
            return Err(RegistryError::Decode("string offset out of range".into()));
        }
        let len = usize::try_from(U256::from_be_slice(&self.data[offset..offset + 32]))
            .map_err(|_| RegistryError::Decode("string length exceeds usize".into()))?;
        let start = offset + 32;
        if self.data.len() < start + len {
            return Err(RegistryError::Decode("string body out of range".into()));
        }
        String::from_utf8(self.data[start..start + len].to_vec())
            .map_err(|e| RegistryError::Decode(format!("string is not utf-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_role_selector_matches_known_value() {
        // The shared AccessControl selector, as published everywhere.
        assert_eq!(selector(functions::HAS_ROLE), [0x91, 0xd1, 0x48, 0x54]);
    }

    #[test]
    fn static_call_layout() {
        let data = encode_call(
            functions::APPROVE_EVIDENCE,
            &[Token::Uint(U256::from(101u64)), Token::Uint(U256::from(2u64))],
        );
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &selector(functions::APPROVE_EVIDENCE));
        assert_eq!(data[4 + 31], 101);
        assert_eq!(data[4 + 63], 2);
    }

    #[test]
    fn address_is_right_aligned() {
        let addr = Address::repeat_byte(0xab);
        let words = encode_tokens(&[Token::Addr(addr)]);
        assert_eq!(words.len(), 32);
        assert!(words[..12].iter().all(|b| *b == 0));
        assert_eq!(&words[12..], addr.as_slice());
    }

    #[test]
    fn bool_encodes_to_last_byte() {
        let words = encode_tokens(&[Token::Bool(true), Token::Bool(false)]);
        assert_eq!(words[31], 1);
        assert_eq!(words[63], 0);
    }

    #[test]
    fn string_head_points_past_heads() {
        let words = encode_tokens(&[Token::Uint(U256::from(7u64)), Token::Str("abc".into())]);
        // Two head words, so the string tail starts at byte 64.
        assert_eq!(U256::from_be_slice(&words[32..64]), U256::from(64u64));
        assert_eq!(U256::from_be_slice(&words[64..96]), U256::from(3u64));
        assert_eq!(&words[96..99], b"abc");
        assert_eq!(words.len(), 128);
    }

    #[test]
    fn string_padding_is_word_aligned() {
        let words = encode_tokens(&[Token::Str("a".repeat(33))]);
        // Head word + length word + two body words.
        assert_eq!(words.len(), 32 + 32 + 64);
    }

    #[test]
    fn empty_string_has_no_body() {
        let words = encode_tokens(&[Token::Str(String::new())]);
        assert_eq!(words.len(), 64);
        let d = Decoder::new(&words);
        assert_eq!(d.string(0).unwrap(), "");
    }

    #[test]
    fn submit_evidence_roundtrip() {
        let data = encode_call(
            functions::SUBMIT_EVIDENCE_TO_CASE,
            &[
                Token::Uint(U256::from(101u64)),
                Token::Str("a".repeat(64)),
                Token::Str("bafy123".into()),
                Token::Uint(U256::from(1u64)),
                Token::Str(String::new()),
            ],
        );
        let (sel, d) = Decoder::from_calldata(&data).unwrap();
        assert_eq!(sel, selector(functions::SUBMIT_EVIDENCE_TO_CASE));
        assert_eq!(d.u64(0).unwrap(), 101);
        assert_eq!(d.string(1).unwrap(), "a".repeat(64));
        assert_eq!(d.string(2).unwrap(), "bafy123");
        assert_eq!(d.u8(3).unwrap(), 1);
        assert_eq!(d.string(4).unwrap(), "");
    }

    #[test]
    fn decoder_rejects_truncated_words() {
        let d = Decoder::new(&[0u8; 16]);
        assert!(matches!(d.u256(0), Err(RegistryError::Decode(_))));
    }

    #[test]
    fn decoder_rejects_out_of_range_string() {
        let words = encode_tokens(&[Token::Uint(U256::from(1024u64))]);
        let d = Decoder::new(&words);
        assert!(matches!(d.string(0), Err(RegistryError::Decode(_))));
    }

    #[test]
    fn u64_overflow_is_a_decode_error() {
        let words = encode_tokens(&[Token::Uint(U256::MAX)]);
        let d = Decoder::new(&words);
        assert!(matches!(d.u64(0), Err(RegistryError::Decode(_))));
    }

    #[test]
    fn from_calldata_rejects_short_input() {
        assert!(Decoder::from_calldata(&[0x12, 0x34]).is_err());
    }
}
