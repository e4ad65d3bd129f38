use serde::{Deserialize, Serialize};

/// Configuration for the storage-network client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the upload/auth API.
    pub api_base: String,
    /// Base URL of the public retrieval gateway.
    pub gateway_base: String,
    /// API key for the upload service.
    pub api_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base: "https://node.lighthouse.storage".into(),
            gateway_base: "https://gateway.lighthouse.storage".into(),
            api_key: String::new(),
        }
    }
}

impl StorageConfig {
    /// Join a path onto a base URL without doubling slashes.
    pub(crate) fn join(base: &str, path: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

/// HTTP endpoint paths on the upload/auth API.
pub mod endpoints {
    pub const AUTH_MESSAGE: &str = "/api/auth/get_message";
    pub const UPLOAD_ENCRYPTED: &str = "/api/v0/add_encrypted";
    pub const UPLOAD_TEXT_ENCRYPTED: &str = "/api/v0/add_text_encrypted";
    pub const UPLOAD_PLAIN: &str = "/api/v0/add";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_public_network() {
        let c = StorageConfig::default();
        assert!(c.api_base.starts_with("https://"));
        assert!(c.gateway_base.starts_with("https://"));
        assert!(c.api_key.is_empty());
    }

    #[test]
    fn join_handles_trailing_slash() {
        assert_eq!(
            StorageConfig::join("https://x.example/", "/api/auth/get_message"),
            "https://x.example/api/auth/get_message"
        );
        assert_eq!(
            StorageConfig::join("https://x.example", "/api/v0/add"),
            "https://x.example/api/v0/add"
        );
    }
}
