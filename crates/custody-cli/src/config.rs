use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use custody_storage::StorageConfig;
use custody_types::Address;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "custody.toml";

/// Configuration for the `custody` binary.
///
/// Resolution order: built-in defaults, then the TOML file, then
/// `CUSTODY_*` environment variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub rpc_url: String,
    /// Hex address of the deployed registry contract.
    pub contract: String,
    pub chain_id: u64,
    /// File holding the signer's secret key as hex. Without it, only
    /// read commands work.
    pub key_file: Option<PathBuf>,
    pub marker_path: PathBuf,
    pub storage: StorageConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract: String::new(),
            chain_id: 31337,
            key_file: None,
            marker_path: PathBuf::from(".custody/wallet-connected"),
            storage: StorageConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or from `custody.toml` if present, or defaults.
    /// Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.override_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn override_from<F: Fn(&str) -> Option<String>>(&mut self, get: F) {
        if let Some(v) = get("CUSTODY_RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = get("CUSTODY_CONTRACT") {
            self.contract = v;
        }
        if let Some(v) = get("CUSTODY_CHAIN_ID") {
            if let Ok(id) = v.parse() {
                self.chain_id = id;
            }
        }
        if let Some(v) = get("CUSTODY_KEY_FILE") {
            self.key_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("CUSTODY_MARKER_PATH") {
            self.marker_path = PathBuf::from(v);
        }
        if let Some(v) = get("CUSTODY_STORAGE_API_BASE") {
            self.storage.api_base = v;
        }
        if let Some(v) = get("CUSTODY_STORAGE_GATEWAY_BASE") {
            self.storage.gateway_base = v;
        }
        if let Some(v) = get("CUSTODY_STORAGE_API_KEY") {
            self.storage.api_key = v;
        }
    }

    pub fn contract_address(&self) -> anyhow::Result<Address> {
        anyhow::ensure!(
            !self.contract.is_empty(),
            "no registry contract configured; set `contract` in custody.toml or CUSTODY_CONTRACT"
        );
        Address::from_str(&self.contract)
            .with_context(|| format!("invalid contract address {:?}", self.contract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_node() {
        let c = CliConfig::default();
        assert_eq!(c.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(c.chain_id, 31337);
        assert!(c.key_file.is_none());
        assert!(c.contract_address().is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let raw = r#"
            rpc_url = "https://rpc.example"
            contract = "0x9999999999999999999999999999999999999999"
            chain_id = 11155111

            [storage]
            api_key = "k-123"
        "#;
        let c: CliConfig = toml::from_str(raw).unwrap();
        assert_eq!(c.rpc_url, "https://rpc.example");
        assert_eq!(c.chain_id, 11155111);
        assert_eq!(c.storage.api_key, "k-123");
        // Unset sections keep their defaults.
        assert!(c.storage.api_base.starts_with("https://"));
        assert_eq!(
            c.contract_address().unwrap(),
            Address::repeat_byte(0x99)
        );
    }

    #[test]
    fn env_overrides_win() {
        let mut c = CliConfig::default();
        c.contract = "0x1111111111111111111111111111111111111111".into();
        c.override_from(|key| match key {
            "CUSTODY_RPC_URL" => Some("https://override.example".into()),
            "CUSTODY_CONTRACT" => {
                Some("0x2222222222222222222222222222222222222222".into())
            }
            "CUSTODY_STORAGE_API_KEY" => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(c.rpc_url, "https://override.example");
        assert_eq!(c.contract_address().unwrap(), Address::repeat_byte(0x22));
        assert_eq!(c.storage.api_key, "from-env");
    }

    #[test]
    fn bad_chain_id_env_is_ignored() {
        let mut c = CliConfig::default();
        c.override_from(|key| (key == "CUSTODY_CHAIN_ID").then(|| "not-a-number".into()));
        assert_eq!(c.chain_id, 31337);
    }
}
