use std::fmt;

use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Access-control role identifier, a 32-byte value the registry contract
/// checks grants against.
///
/// Named roles are the keccak-256 hash of the role name. The admin role is
/// the distinguished all-zero value, which no name hashes to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId([u8; 32]);

impl RoleId {
    /// The contract's default admin role (all zeros).
    pub const DEFAULT_ADMIN: RoleId = RoleId([0u8; 32]);

    /// Derive a role id from its name.
    pub fn from_name(name: &str) -> Self {
        Self(keccak256(name.as_bytes()).0)
    }

    /// The role granted to sworn officers.
    pub fn police() -> Self {
        Self::from_name("POLICE_ROLE")
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
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

impl fmt::Debug for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 32]> for RoleId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn police_role_is_keccak_of_name() {
        // keccak256("POLICE_ROLE"), the value the deployed contract uses.
        assert_eq!(
            RoleId::police().to_hex(),
            "3c897272fb756004d8a8588422a9ce6e04768b2d705bbde7a87ceb35e9b9c5d9"
        );
    }

    #[test]
    fn default_admin_is_all_zeros() {
        assert_eq!(RoleId::DEFAULT_ADMIN.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn no_name_hashes_to_admin() {
        assert_ne!(RoleId::from_name(""), RoleId::DEFAULT_ADMIN);
        assert_ne!(RoleId::from_name("DEFAULT_ADMIN_ROLE"), RoleId::DEFAULT_ADMIN);
    }

    #[test]
    fn from_name_is_deterministic() {
        assert_eq!(RoleId::from_name("AUDITOR"), RoleId::from_name("AUDITOR"));
        assert_ne!(RoleId::from_name("AUDITOR"), RoleId::from_name("POLICE_ROLE"));
    }

    #[test]
    fn hex_roundtrip_with_prefix() {
        let role = RoleId::police();
        let parsed = RoleId::from_hex(&format!("0x{}", role.to_hex())).unwrap();
        assert_eq!(role, parsed);
    }

    #[test]
    fn from_hex_rejects_short_input() {
        assert!(matches!(
            RoleId::from_hex("abcd"),
            Err(TypeError::InvalidLength { .. })
        ));
    }
}
